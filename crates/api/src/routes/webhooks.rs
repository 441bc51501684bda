//! Route definition for the provider callback endpoint.
//!
//! Mounted at the root (`/webhook`), matching the callback URL handed to
//! the provider at dispatch time.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(webhooks::receive_webhook))
}
