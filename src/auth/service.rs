use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::error::AuthError;
use crate::auth::model::{NewUser, User, UserKey};
use crate::auth::password;
use crate::auth::token::TokenKeys;
use crate::repo::{RepoError, Repository};

/// The user store as the service sees it; swapped for `MemoryUsers` in tests.
pub type UserRepo = dyn Repository<Record = User, New = NewUser, Key = UserKey>;

/// All business rules for accounts and sessions live here. The service itself
/// is stateless: every call stands alone against the store and the keys.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<UserRepo>,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(users: Arc<UserRepo>, keys: TokenKeys) -> Self {
        Self { users, keys }
    }

    /// Create an account. The store only ever sees the hash; duplicate emails
    /// surface as `EmailTaken` via the store's unique constraint.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let password_hash = password::hash_password(password)?;
        let new_user = NewUser {
            email: email.to_owned(),
            password_hash,
        };
        match self.users.add(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                Ok(user)
            }
            Err(RepoError::DuplicateKey) => {
                warn!(email = %email, "email already registered");
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(AuthError::Storage(e)),
        }
    }

    /// Check a password against the stored hash. An unknown email and a wrong
    /// password fail identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.users.get(UserKey::Email(email.to_owned())).await?;
        match user {
            Some(user) if password::verify_password(password, &user.password_hash) => Ok(user),
            _ => {
                warn!(email = %email, "login rejected");
                Err(AuthError::IncorrectCredentials)
            }
        }
    }

    /// Authenticate and issue a bearer token with the configured lifetime.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self.authenticate(email, password).await?;
        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Resolve the bearer of `token`. A bad token and a token naming a user
    /// that no longer exists fail identically.
    pub async fn resolve_current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self
            .keys
            .verify(token)
            .map_err(|_| AuthError::InvalidCredentials)?;
        let user = self.users.get(UserKey::Id(claims.sub)).await?;
        user.ok_or(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryUsers;
    use crate::config::AuthConfig;
    use time::Duration;
    use uuid::Uuid;

    fn make_service() -> AuthService {
        let keys = TokenKeys::from_config(&AuthConfig {
            secret: "dev-secret".into(),
            algorithm: "HS256".into(),
            token_ttl_minutes: 5,
        })
        .expect("keys from config");
        AuthService::new(Arc::new(MemoryUsers::new()), keys)
    }

    #[tokio::test]
    async fn register_login_resolve_flow() {
        let service = make_service();

        let user = service
            .register("alice@example.com", "secret123")
            .await
            .expect("register");
        assert!(!user.is_active);
        assert_ne!(user.password_hash, "secret123");

        // outward serialization never carries the hash
        let json = serde_json::to_value(&user).expect("serialize");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");

        let token = service
            .login("alice@example.com", "secret123")
            .await
            .expect("login");
        let resolved = service.resolve_current_user(&token).await.expect("resolve");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let service = make_service();
        service
            .register("alice@example.com", "secret123")
            .await
            .expect("first register");
        let err = service
            .register("alice@example.com", "other-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_identically() {
        let service = make_service();
        service
            .register("alice@example.com", "secret123")
            .await
            .expect("register");

        let unknown = service
            .login("nobody@example.com", "anything")
            .await
            .unwrap_err();
        let wrong = service
            .login("alice@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(unknown, AuthError::IncorrectCredentials));
        assert!(matches!(wrong, AuthError::IncorrectCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn expired_token_does_not_resolve() {
        let service = make_service();
        let user = service
            .register("alice@example.com", "secret123")
            .await
            .expect("register");

        let token = service
            .keys
            .sign_with_ttl(user.id, Duration::seconds(-30))
            .expect("sign");
        let err = service.resolve_current_user(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn token_for_missing_user_fails_like_a_bad_token() {
        let service = make_service();

        let orphan = service.keys.sign(Uuid::new_v4()).expect("sign");
        let missing = service.resolve_current_user(&orphan).await.unwrap_err();
        let garbage = service.resolve_current_user("not.a.token").await.unwrap_err();

        assert!(matches!(missing, AuthError::InvalidCredentials));
        assert!(matches!(garbage, AuthError::InvalidCredentials));
        assert_eq!(missing.to_string(), garbage.to_string());
    }
}
