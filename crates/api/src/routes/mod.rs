//! Route definitions.
//!
//! `/health` and `/webhook` are mounted at the root; everything else
//! lives under `/api/v1`.

pub mod admin;
pub mod generations;
pub mod health;
pub mod models;
pub mod transactions;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/generations", generations::router())
        .nest("/transactions", transactions::router())
        .nest("/models", models::router())
        .nest("/admin", admin::router())
}
