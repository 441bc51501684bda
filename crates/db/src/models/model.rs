//! Generation model catalog entity.
//!
//! One row per dispatchable model: the provider reference, display
//! metadata, and the pricing schema consumed by
//! [`skinny_core::pricing::estimate_cost`].

use std::collections::HashMap;

use serde::Serialize;
use sqlx::FromRow;
use skinny_core::error::CoreError;
use skinny_core::pricing::{ModelPricing, PricingKind};
use skinny_core::types::{DbId, Timestamp};

/// A model row from the `models` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Model {
    pub id: DbId,
    /// Stable short identifier used by clients (e.g. `"veo-3-fast"`).
    pub slug: String,
    pub display_name: String,
    /// Provider-side model version reference submitted with predictions.
    pub provider_version: String,
    /// `"image"` or `"video"`.
    pub category: String,
    pub is_active: bool,
    /// `"flat_rate"` or `"per_second"`.
    pub pricing_type: String,
    pub cost_per_run_cents: i64,
    pub cost_per_second_cents: i64,
    pub cost_per_second_with_audio_cents: Option<i64>,
    pub duration_options: Vec<i32>,
    pub default_duration_seconds: i32,
    pub resolution_options: Vec<String>,
    pub default_resolution: String,
    /// JSON object mapping resolution -> cost multiplier.
    pub resolution_multipliers: serde_json::Value,
    pub supports_audio: bool,
    pub supports_sequential: bool,
    pub max_sequential_images: i32,
    /// Whether the final charge multiplies the per-unit estimate by the
    /// actual output count.
    pub scales_with_outputs: bool,
    pub created_at: Timestamp,
}

impl Model {
    /// Build the pricing view consumed by the cost estimator.
    ///
    /// An unknown `pricing_type` is a data error (the column is seeded by
    /// migrations), surfaced as an internal error rather than a panic.
    pub fn pricing(&self) -> Result<ModelPricing, CoreError> {
        let kind = PricingKind::parse(&self.pricing_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "Model '{}' has unknown pricing type '{}'",
                self.slug, self.pricing_type
            ))
        })?;

        let resolution_multipliers: HashMap<String, f64> =
            serde_json::from_value(self.resolution_multipliers.clone()).unwrap_or_default();

        Ok(ModelPricing {
            kind,
            cost_per_run_cents: self.cost_per_run_cents,
            cost_per_second_cents: self.cost_per_second_cents,
            cost_per_second_with_audio_cents: self.cost_per_second_with_audio_cents,
            duration_options: self.duration_options.clone(),
            default_duration_seconds: self.default_duration_seconds,
            resolution_options: self.resolution_options.clone(),
            default_resolution: self.default_resolution.clone(),
            resolution_multipliers,
            supports_audio: self.supports_audio,
            supports_sequential: self.supports_sequential,
            max_sequential_images: self.max_sequential_images,
        })
    }
}
