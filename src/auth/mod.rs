use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod error;
pub(crate) mod extractor;
pub mod handlers;
pub mod model;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
