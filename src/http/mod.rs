use axum::Router;

use crate::AppState;

mod admin;
mod auth;
mod error;
mod handlers;
pub mod routes;
pub mod viewsets;

pub use auth::{AdminToken, ADMIN_TOKEN_HEADER};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .nest(&state.api_prefix, routes::api())
        .merge(admin::router(&state))
        .with_state(state)
}
