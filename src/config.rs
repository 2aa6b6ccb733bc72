use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub algorithm: String,
    pub token_ttl_minutes: i64,
}

impl AuthConfig {
    /// Signing algorithm parsed from config; only HMAC variants make sense
    /// with a shared secret.
    pub fn algorithm(&self) -> anyhow::Result<Algorithm> {
        let alg = Algorithm::from_str(&self.algorithm)
            .map_err(|_| anyhow::anyhow!("unknown signing algorithm {:?}", self.algorithm))?;
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
            other => anyhow::bail!("algorithm {other:?} requires a key pair, not a secret"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            secret: std::env::var("AUTH_SECRET_KEY")?,
            algorithm: std::env::var("AUTH_ALGORITHM").unwrap_or_else(|_| "HS256".into()),
            token_ttl_minutes: std::env::var("AUTH_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        Ok(Self { database_url, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_algorithm(algorithm: &str) -> AuthConfig {
        AuthConfig {
            secret: "test".into(),
            algorithm: algorithm.into(),
            token_ttl_minutes: 30,
        }
    }

    #[test]
    fn parses_hmac_algorithms() {
        for alg in ["HS256", "HS384", "HS512"] {
            assert!(config_with_algorithm(alg).algorithm().is_ok());
        }
    }

    #[test]
    fn rejects_asymmetric_and_unknown_algorithms() {
        assert!(config_with_algorithm("RS256").algorithm().is_err());
        assert!(config_with_algorithm("none").algorithm().is_err());
    }
}
