//! Generation dispatch, status re-check, and library listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use skinny_core::error::CoreError;
use skinny_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use skinny_core::pricing::{estimate_cost, CostEstimate, GenerationParams};
use skinny_core::types::DbId;
use skinny_db::models::generation::{CreateGeneration, Generation, GenerationStatus};
use skinny_db::repositories::{GenerationRepo, ModelRepo};
use skinny_replicate::CreatePredictionRequest;

use crate::billing::{FinalizeEntry, Finalizer};
use crate::error::{AppError, AppResult};
use crate::extract::CurrentUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Request body for dispatching a generation.
#[derive(Debug, Deserialize)]
pub struct CreateGenerationRequest {
    /// Model slug from the catalog (e.g. `"veo-3-fast"`).
    pub model: String,
    pub prompt: String,
    #[serde(flatten)]
    pub params: GenerationParams,
}

/// Response body for a successful dispatch.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub generation_id: DbId,
    pub provider_job_id: String,
    pub status: GenerationStatus,
    /// Per-unit estimate shown to the user.
    pub cost_cents: i64,
    /// Worst-case charge used for the affordability check.
    pub max_cost_cents: i64,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// POST /api/v1/generations
///
/// Validates affordability, creates the generation record, and submits
/// the job to the provider with an asynchronous webhook callback. No
/// charge happens here; billing is deferred to completion because the
/// final cost can differ from the estimate.
pub async fn create_generation(
    CurrentUser(profile): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGenerationRequest>,
) -> AppResult<impl IntoResponse> {
    if input.prompt.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "prompt must not be empty".into(),
        )));
    }

    let model = ModelRepo::find_active_by_slug(&state.pool, &input.model)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Unknown or inactive model '{}'",
                input.model
            )))
        })?;

    let pricing = model.pricing()?;
    let estimate = estimate_cost(&pricing, &input.params);

    if !profile.lifetime_access && profile.balance_cents < estimate.max_cost_cents {
        return Err(AppError::Core(CoreError::InsufficientBalance {
            required_cents: estimate.max_cost_cents,
            available_cents: profile.balance_cents,
        }));
    }

    let generation = GenerationRepo::create(
        &state.pool,
        &CreateGeneration {
            profile_id: profile.id,
            model_slug: model.slug.clone(),
            model_category: model.category.clone(),
            prompt: input.prompt.trim().to_string(),
            duration_seconds: estimate.duration_seconds,
            resolution: estimate.resolution.clone(),
            generate_audio: input.params.generate_audio,
            sequential_mode: input.params.sequential_mode.clone(),
            max_images: input.params.max_images,
            cost_cents: estimate.cost_cents,
            scales_with_outputs: model.scales_with_outputs,
        },
    )
    .await?;

    let settings = state.settings.get(&state.pool).await?;
    let Some(token) = settings.replicate_api_token.as_deref() else {
        GenerationRepo::mark_terminal(
            &state.pool,
            generation.id,
            GenerationStatus::Failed,
            Some("Provider API token is not configured"),
        )
        .await?;
        return Err(AppError::Provider(
            "Provider API token is not configured".into(),
        ));
    };

    let request = CreatePredictionRequest::new(
        model.provider_version.clone(),
        prediction_input(&input.prompt, &input.params, &estimate),
        Some(state.config.webhook_url()),
    );

    let prediction = match state.replicate.create_prediction(token, &request).await {
        Ok(prediction) => prediction,
        Err(e) => {
            // Never leave a dispatched-looking record behind a failed
            // submission.
            GenerationRepo::mark_terminal(
                &state.pool,
                generation.id,
                GenerationStatus::Failed,
                Some(&e.to_string()),
            )
            .await?;
            return Err(AppError::Provider(format!("Dispatch failed: {e}")));
        }
    };

    GenerationRepo::set_provider_job_id(&state.pool, generation.id, &prediction.id).await?;

    tracing::info!(
        generation_id = generation.id,
        profile_id = profile.id,
        model = %model.slug,
        provider_job_id = %prediction.id,
        cost_cents = estimate.cost_cents,
        max_cost_cents = estimate.max_cost_cents,
        "Generation dispatched"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DispatchResponse {
                generation_id: generation.id,
                provider_job_id: prediction.id,
                status: generation.status,
                cost_cents: estimate.cost_cents,
                max_cost_cents: estimate.max_cost_cents,
            },
        }),
    ))
}

/// Build the provider input payload from the request parameters.
///
/// Effective (defaulted) duration/resolution are sent rather than the
/// raw request values, so the provider runs exactly what was priced.
fn prediction_input(
    prompt: &str,
    params: &GenerationParams,
    estimate: &CostEstimate,
) -> serde_json::Value {
    let mut input = serde_json::Map::new();
    input.insert("prompt".into(), prompt.trim().into());
    if let Some(duration) = estimate.duration_seconds {
        input.insert("duration".into(), duration.into());
    }
    if let Some(resolution) = &estimate.resolution {
        input.insert("resolution".into(), resolution.as_str().into());
    }
    if let Some(generate_audio) = params.generate_audio {
        input.insert("generate_audio".into(), generate_audio.into());
    }
    if let Some(mode) = &params.sequential_mode {
        input.insert("sequential_image_generation".into(), mode.as_str().into());
    }
    if let Some(max_images) = params.max_images {
        input.insert("max_images".into(), max_images.into());
    }
    serde_json::Value::Object(input)
}

// ---------------------------------------------------------------------------
// Status re-check (recovery path)
// ---------------------------------------------------------------------------

/// GET /api/v1/generations/{id}
///
/// Returns the record; when it is still pending (or succeeded but not
/// yet billed), re-queries the provider and feeds the result through the
/// same finalize path as the webhook, so a lost callback cannot strand a
/// generation.
pub async fn check_generation(
    CurrentUser(profile): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let generation = GenerationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Generation",
            id,
        }))?;

    if generation.profile_id != profile.id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Generation belongs to another user".into(),
        )));
    }

    let needs_recheck = !generation.status.is_terminal()
        || (generation.status == GenerationStatus::Succeeded && !generation.billing_complete());

    let generation = if needs_recheck {
        recheck_with_provider(&state, generation).await?
    } else {
        generation
    };

    Ok(Json(DataResponse { data: generation }))
}

/// Re-query the provider and run the result through the finalizer,
/// returning the refreshed record. A provider error leaves the record as
/// it was; the next poll retries.
async fn recheck_with_provider(
    state: &AppState,
    generation: Generation,
) -> AppResult<Generation> {
    let Some(provider_job_id) = generation.provider_job_id.clone() else {
        return Ok(generation);
    };

    let settings = state.settings.get(&state.pool).await?;
    let Some(token) = settings.replicate_api_token.as_deref() else {
        tracing::warn!(
            generation_id = generation.id,
            "Cannot re-check status: provider API token is not configured"
        );
        return Ok(generation);
    };

    match state.replicate.get_prediction(token, &provider_job_id).await {
        Ok(prediction) => {
            let result = prediction.into_provider_result();
            Finalizer::new(&state.pool, &state.archiver)
                .apply(&generation, &result, FinalizeEntry::ManualCheck)
                .await?;

            Ok(GenerationRepo::find_by_id(&state.pool, generation.id)
                .await?
                .unwrap_or(generation))
        }
        Err(e) => {
            tracing::warn!(
                generation_id = generation.id,
                provider_job_id = %provider_job_id,
                error = %e,
                "Provider status re-check failed, returning stored state"
            );
            Ok(generation)
        }
    }
}

// ---------------------------------------------------------------------------
// Library listing
// ---------------------------------------------------------------------------

/// GET /api/v1/generations
///
/// The caller's generation library, newest first.
pub async fn list_generations(
    CurrentUser(profile): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let generations =
        GenerationRepo::list_for_profile(&state.pool, profile.id, limit, offset).await?;

    Ok(Json(DataResponse { data: generations }))
}
