use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::service::AuthService;
use crate::auth::store::PgUsers;
use crate::auth::token::TokenKeys;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Self::from_parts(db, config)
    }

    /// Assemble the state from preconstructed parts; `init` and tests share
    /// this path.
    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let keys = TokenKeys::from_config(&config.auth)?;
        let users = Arc::new(PgUsers::new(db.clone()));
        let auth = AuthService::new(users, keys);
        Ok(Self { db, config, auth })
    }
}
