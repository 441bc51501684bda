//! Model catalog listing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use skinny_db::repositories::ModelRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/models
///
/// Active models with their pricing schema, for client-side cost display.
pub async fn list_models(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let models = ModelRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: models }))
}
