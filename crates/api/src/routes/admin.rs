//! Route definitions for the admin surface.
//!
//! ```text
//! GET    /settings                 get_settings
//! PUT    /settings                 update_settings
//! POST   /profiles                 create_profile
//! POST   /profiles/{id}/credit     credit_profile
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route("/profiles", post(admin::create_profile))
        .route("/profiles/{id}/credit", post(admin::credit_profile))
}
