use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repo::RepoError;

/// Business-level failures of the auth core.
///
/// `IncorrectCredentials` and `InvalidCredentials` each cover several internal
/// causes on purpose; the collapsed message is the contract. `Storage` stays
/// separate so an outage is never reported as an auth failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailTaken,
    #[error("incorrect email or password")]
    IncorrectCredentials,
    #[error("could not validate credentials")]
    InvalidCredentials,
    #[error("storage unavailable")]
    Storage(#[from] RepoError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::EmailTaken => (StatusCode::CONFLICT, self.to_string()),
            AuthError::IncorrectCredentials | AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthError::Storage(e) => {
                error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
            }
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
            }
        };

        let body = Json(json!({ "detail": message }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_email_and_wrong_password_share_a_message() {
        assert_eq!(
            AuthError::IncorrectCredentials.to_string(),
            "incorrect email or password"
        );
    }

    #[test]
    fn unauthorized_responses_challenge_with_bearer() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }

    #[test]
    fn storage_failure_is_not_an_auth_failure() {
        let err = AuthError::from(RepoError::Unavailable(sqlx::Error::PoolClosed));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
