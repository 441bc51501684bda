//! Admin handlers: platform settings and user profile management.
//!
//! All endpoints require the admin bearer token via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use skinny_core::error::CoreError;
use skinny_core::types::DbId;
use skinny_db::models::platform_settings::UpdatePlatformSettings;
use skinny_db::models::profile::CreateProfile;
use skinny_db::models::transaction::{CreateTransaction, TX_TYPE_TOPUP};
use skinny_db::repositories::{ProfileRepo, SettingsRepo, TransactionRepo};

use crate::error::{AppError, AppResult};
use crate::extract::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Platform settings
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/settings
pub async fn get_settings(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let settings = SettingsRepo::get(&state.pool).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/admin/settings
///
/// Partial update; invalidates the in-process settings cache so the
/// next request observes the new credentials.
pub async fn update_settings(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdatePlatformSettings>,
) -> AppResult<impl IntoResponse> {
    let updated = SettingsRepo::update(&state.pool, &input).await?;
    state.settings.invalidate().await;

    tracing::info!("Platform settings updated, cache invalidated");

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/profiles
///
/// Provision a profile for a platform user.
pub async fn create_profile(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProfile>,
) -> AppResult<impl IntoResponse> {
    if input.platform_user_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "platform_user_id must not be empty".into(),
        ));
    }
    if input.balance_cents < 0 {
        return Err(AppError::BadRequest(
            "balance_cents must not be negative".into(),
        ));
    }

    let profile = ProfileRepo::create(&state.pool, &input).await?;

    tracing::info!(
        profile_id = profile.id,
        platform_user_id = %profile.platform_user_id,
        "Profile provisioned"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: profile })))
}

/// Request body for crediting a profile.
#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub amount_cents: i64,
    /// Optional ledger note (e.g. the commerce platform's order id).
    pub note: Option<String>,
}

/// POST /api/v1/admin/profiles/{id}/credit
///
/// Apply a top-up to a profile balance and append the matching ledger
/// entry (used when reconciling commerce-platform purchases).
pub async fn credit_profile(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(profile_id): Path<DbId>,
    Json(input): Json<CreditRequest>,
) -> AppResult<impl IntoResponse> {
    if input.amount_cents <= 0 {
        return Err(AppError::BadRequest(
            "amount_cents must be positive".into(),
        ));
    }

    let new_balance = ProfileRepo::credit(&state.pool, profile_id, input.amount_cents)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: profile_id,
        }))?;

    TransactionRepo::create(
        &state.pool,
        &CreateTransaction {
            profile_id,
            generation_id: None,
            amount_cents: input.amount_cents,
            tx_type: TX_TYPE_TOPUP.to_string(),
            label: input
                .note
                .clone()
                .unwrap_or_else(|| "Credit top-up".to_string()),
            preview_url: None,
            metadata: json!({}),
        },
    )
    .await?;

    tracing::info!(
        profile_id,
        amount_cents = input.amount_cents,
        new_balance,
        "Profile credited"
    );

    Ok(Json(DataResponse {
        data: json!({ "profile_id": profile_id, "balance_cents": new_balance }),
    }))
}
