//! Generation cost estimation.
//!
//! Computes a deterministic cost in integer cents for a generation request
//! from a model's pricing configuration. Invalid or missing parameters fall
//! back to the model's declared defaults rather than being rejected, so
//! pricing math itself has no failure modes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Resolution multiplier applied when a resolution has no entry in the
/// model's multiplier table.
pub const DEFAULT_RESOLUTION_MULTIPLIER: f64 = 1.0;

/// Sequential-generation mode value that triggers worst-case pricing.
pub const SEQUENTIAL_MODE_AUTO: &str = "auto";

// ---------------------------------------------------------------------------
// Pricing kind
// ---------------------------------------------------------------------------

/// How a model is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingKind {
    /// A fixed price per run, regardless of parameters.
    FlatRate,
    /// A per-second rate scaled by duration and resolution.
    PerSecond,
}

impl PricingKind {
    /// Parse from the database `pricing_type` column.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "flat_rate" => Some(Self::FlatRate),
            "per_second" => Some(Self::PerSecond),
            _ => None,
        }
    }

    /// Database column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FlatRate => "flat_rate",
            Self::PerSecond => "per_second",
        }
    }
}

// ---------------------------------------------------------------------------
// Model pricing view
// ---------------------------------------------------------------------------

/// Pricing configuration for one model, decoupled from the database row.
#[derive(Debug, Clone)]
pub struct ModelPricing {
    pub kind: PricingKind,
    /// Flat price in cents (flat-rate models).
    pub cost_per_run_cents: i64,
    /// Per-second rate in cents without audio (per-second models).
    pub cost_per_second_cents: i64,
    /// Per-second rate in cents when audio is generated, if the model
    /// prices audio separately.
    pub cost_per_second_with_audio_cents: Option<i64>,
    /// Durations (seconds) the model accepts.
    pub duration_options: Vec<i32>,
    pub default_duration_seconds: i32,
    /// Resolutions the model accepts (e.g. `"720p"`).
    pub resolution_options: Vec<String>,
    pub default_resolution: String,
    /// Cost multiplier per resolution; missing entries count as 1.0.
    pub resolution_multipliers: HashMap<String, f64>,
    pub supports_audio: bool,
    pub supports_sequential: bool,
    /// Upper bound on images per sequential run.
    pub max_sequential_images: i32,
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Caller-supplied generation parameters. All optional; invalid values
/// fall back to model defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    pub duration_seconds: Option<i32>,
    pub resolution: Option<String>,
    pub generate_audio: Option<bool>,
    /// `"auto"` requests provider-driven sequential image generation.
    pub sequential_mode: Option<String>,
    /// Cap on images for a sequential run.
    pub max_images: Option<i32>,
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

/// Result of cost estimation.
///
/// `cost_cents` is the per-unit estimate shown to the user and stored on
/// the generation record; `max_cost_cents` is the worst-case charge used
/// for the pre-flight affordability check. The two differ only for
/// sequential multi-image requests.
#[derive(Debug, Clone, Serialize)]
pub struct CostEstimate {
    pub cost_cents: i64,
    pub max_cost_cents: i64,
    /// Effective duration after defaulting (per-second models only).
    pub duration_seconds: Option<i32>,
    /// Effective resolution after defaulting (per-second models only).
    pub resolution: Option<String>,
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Estimate the cost of a generation request against a model's pricing.
pub fn estimate_cost(model: &ModelPricing, params: &GenerationParams) -> CostEstimate {
    match model.kind {
        PricingKind::FlatRate => {
            let cost = model.cost_per_run_cents;
            CostEstimate {
                cost_cents: cost,
                max_cost_cents: max_sequential_cost(model, params, cost),
                duration_seconds: None,
                resolution: None,
            }
        }
        PricingKind::PerSecond => {
            let duration = params
                .duration_seconds
                .filter(|d| model.duration_options.contains(d))
                .unwrap_or(model.default_duration_seconds);

            let resolution = params
                .resolution
                .as_ref()
                .filter(|r| model.resolution_options.contains(*r))
                .cloned()
                .unwrap_or_else(|| model.default_resolution.clone());

            let multiplier = model
                .resolution_multipliers
                .get(&resolution)
                .copied()
                .unwrap_or(DEFAULT_RESOLUTION_MULTIPLIER);

            let rate = per_second_rate(model, params);
            let cost = (rate as f64 * duration as f64 * multiplier).ceil() as i64;

            CostEstimate {
                cost_cents: cost,
                max_cost_cents: max_sequential_cost(model, params, cost),
                duration_seconds: Some(duration),
                resolution: Some(resolution),
            }
        }
    }
}

/// Select the per-second rate, honoring the audio pricing override.
///
/// Audio-capable models charge the with-audio rate unless the caller
/// explicitly passed `generate_audio = false`.
fn per_second_rate(model: &ModelPricing, params: &GenerationParams) -> i64 {
    if model.supports_audio && params.generate_audio != Some(false) {
        model
            .cost_per_second_with_audio_cents
            .unwrap_or(model.cost_per_second_cents)
    } else {
        model.cost_per_second_cents
    }
}

/// Worst-case charge for a sequential "auto" run: per-unit cost times the
/// requested image count, capped at the model's sequential limit.
fn max_sequential_cost(model: &ModelPricing, params: &GenerationParams, cost_cents: i64) -> i64 {
    if !model.supports_sequential
        || params.sequential_mode.as_deref() != Some(SEQUENTIAL_MODE_AUTO)
    {
        return cost_cents;
    }
    let requested = params.max_images.unwrap_or(1);
    if requested <= 1 {
        return cost_cents;
    }
    let effective = requested.min(model.max_sequential_images).max(1);
    cost_cents * i64::from(effective)
}

/// Final charge once the actual output count is known.
///
/// Only models whose pricing scales with output count multiply the
/// per-unit estimate; everything else is charged the original estimate.
pub fn final_cost_cents(cost_cents: i64, output_count: usize, scales_with_outputs: bool) -> i64 {
    if scales_with_outputs {
        cost_cents * output_count.max(1) as i64
    } else {
        cost_cents
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
