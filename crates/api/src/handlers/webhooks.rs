//! Inbound provider webhook intake.
//!
//! Signature verification happens against the raw body before any JSON
//! parsing ("fail closed"). Recognized-but-inapplicable deliveries
//! (unknown job id, duplicates, already-terminal records) are
//! acknowledged with 200 so the provider does not retry-storm.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use skinny_core::error::CoreError;
use skinny_core::finalize::{ProviderJobStatus, ProviderResult};
use skinny_core::signing::{verify_signature, SIGNATURE_HEADERS};
use skinny_db::repositories::GenerationRepo;

use crate::billing::{FinalizeEntry, Finalizer};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Completion callback payload from the provider.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Provider job id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// POST /webhook
///
/// Provider completion callback. Idempotent: redelivering the same
/// event is acknowledged without side effects.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let settings = state.settings.get(&state.pool).await?;

    if let Some(secret) = settings.webhook_signing_secret.as_deref() {
        let provided = SIGNATURE_HEADERS
            .iter()
            .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()));

        let verified = provided
            .map(|signature| verify_signature(secret, &body, signature))
            .unwrap_or(false);

        if !verified {
            tracing::warn!(
                signature_present = provided.is_some(),
                "Rejected webhook with missing or invalid signature"
            );
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid webhook signature".into(),
            )));
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook body: {e}")))?;

    let Some(job_id) = payload.id.as_deref().filter(|id| !id.is_empty()) else {
        return Err(AppError::BadRequest("Missing prediction id".into()));
    };

    let Some(status) = ProviderJobStatus::parse(&payload.status) else {
        tracing::warn!(job_id, status = %payload.status, "Webhook with unrecognized status");
        return Ok(Json(json!({ "ok": true, "message": "Unrecognized status" })));
    };

    let Some(generation) = GenerationRepo::find_by_provider_job_id(&state.pool, job_id).await?
    else {
        // Not a job we created: test traffic or a record from another
        // tenant. Acknowledge so the provider stops redelivering.
        tracing::info!(job_id, "Webhook for unknown prediction, acknowledging");
        return Ok(Json(json!({ "ok": true, "message": "No matching generation" })));
    };

    tracing::info!(
        generation_id = generation.id,
        job_id,
        status = status.as_str(),
        "Processing provider webhook"
    );

    let result = ProviderResult {
        status,
        output: payload.output,
        error: payload.error,
    };

    Finalizer::new(&state.pool, &state.archiver)
        .apply(&generation, &result, FinalizeEntry::Webhook)
        .await?;

    Ok(Json(json!({ "ok": true })))
}
