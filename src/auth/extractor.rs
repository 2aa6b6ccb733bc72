use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::error::AuthError;
use crate::auth::model::User;
use crate::state::AppState;

/// Extracts the caller from the `Authorization: Bearer` header and resolves
/// them to a stored user. A missing or unusable header is rejected with the
/// same uniform condition as a bad token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::InvalidCredentials)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::InvalidCredentials)?;

        let user = state.auth.resolve_current_user(token).await?;
        Ok(CurrentUser(user))
    }
}
