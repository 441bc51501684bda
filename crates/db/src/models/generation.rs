//! Generation record entity and DTOs.
//!
//! One row per generation request. Rows are never deleted; lifecycle
//! status moves through the state machine driven by the finalize path,
//! and the `metadata` JSONB map carries the billing idempotency marker.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use skinny_core::finalize::{RecordPhase, RecordView};
use skinny_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Generation lifecycle status (Postgres enum `generation_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "generation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl GenerationStatus {
    /// Whether this status is terminal (no further provider transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// Collapse into the planner's coarse phase.
    pub fn phase(self) -> RecordPhase {
        match self {
            Self::Starting | Self::Processing => RecordPhase::Pending,
            Self::Succeeded => RecordPhase::Succeeded,
            Self::Failed => RecordPhase::Failed,
            Self::Canceled => RecordPhase::Canceled,
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata keys
// ---------------------------------------------------------------------------

/// Metadata key: billing idempotency marker.
pub const META_BILLING_COMPLETE: &str = "billing_complete";

/// Metadata key: when the charge was committed.
pub const META_BILLED_AT: &str = "billed_at";

/// Metadata key: the committed charge in cents.
pub const META_BILLED_AMOUNT: &str = "billed_amount_cents";

/// Metadata key: which path committed the charge.
pub const META_BILLED_VIA: &str = "billed_via";

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A generation row from the `generations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Generation {
    pub id: DbId,
    pub profile_id: DbId,
    pub model_slug: String,
    /// `"image"` or `"video"` (copied from the model at dispatch).
    pub model_category: String,
    pub prompt: String,
    pub duration_seconds: Option<i32>,
    pub resolution: Option<String>,
    pub generate_audio: Option<bool>,
    pub sequential_mode: Option<String>,
    pub max_images: Option<i32>,
    /// Provider job id; null until dispatch completes.
    pub provider_job_id: Option<String>,
    pub status: GenerationStatus,
    /// Permanent output URLs; empty until finalized.
    pub output_urls: Vec<String>,
    /// Per-unit cost estimate fixed at dispatch time.
    pub cost_cents: i64,
    /// Final charge; null until finalized.
    pub total_cost_cents: Option<i64>,
    /// Snapshot of the model's output-count scaling flag.
    pub scales_with_outputs: bool,
    /// Free-form map carrying billing flags and timestamps.
    pub metadata: serde_json::Value,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Generation {
    /// Whether the exactly-once billing step has committed.
    pub fn billing_complete(&self) -> bool {
        self.metadata
            .get(META_BILLING_COMPLETE)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Build the planner's view of this record.
    pub fn record_view(&self) -> RecordView {
        RecordView {
            phase: self.status.phase(),
            billing_complete: self.billing_complete(),
            stored_output_count: self.output_urls.len(),
            cost_cents: self.cost_cents,
            scales_with_outputs: self.scales_with_outputs,
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a generation record at dispatch time.
#[derive(Debug, Clone)]
pub struct CreateGeneration {
    pub profile_id: DbId,
    pub model_slug: String,
    pub model_category: String,
    pub prompt: String,
    pub duration_seconds: Option<i32>,
    pub resolution: Option<String>,
    pub generate_audio: Option<bool>,
    pub sequential_mode: Option<String>,
    pub max_images: Option<i32>,
    pub cost_cents: i64,
    pub scales_with_outputs: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
