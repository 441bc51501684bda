//! Route definitions for the ledger history.

use axum::routing::get;
use axum::Router;

use crate::handlers::transactions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(transactions::list_transactions))
}
