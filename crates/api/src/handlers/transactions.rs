//! Ledger history for the calling user.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use skinny_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use skinny_db::repositories::TransactionRepo;

use crate::error::AppResult;
use crate::extract::CurrentUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/transactions
///
/// The caller's ledger entries, newest first.
pub async fn list_transactions(
    CurrentUser(profile): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let transactions =
        TransactionRepo::list_for_profile(&state.pool, profile.id, limit, offset).await?;

    Ok(Json(DataResponse { data: transactions }))
}
