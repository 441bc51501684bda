//! Generation finalize state machine.
//!
//! [`plan_finalize`] is the single decision point for processing a
//! provider completion result, whether it arrived as a webhook delivery
//! or a manual status re-check. Both entry points build the same inputs
//! and execute the same plan, so they cannot drift apart.
//!
//! The plan is pure; side effects (archival, balance deduction, ledger
//! insert) are executed by the API layer's finalizer, which guards the
//! billing step with an atomic claim so duplicate deliveries charge at
//! most once.

use serde::Deserialize;

use crate::output::normalize_outputs;
use crate::pricing::final_cost_cents;

// ---------------------------------------------------------------------------
// Provider result
// ---------------------------------------------------------------------------

/// Lifecycle status reported by the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderJobStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl ProviderJobStatus {
    /// Parse a webhook payload status string; `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "starting" => Some(Self::Starting),
            "processing" => Some(Self::Processing),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

/// A provider's view of one job, as delivered by webhook or status poll.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub status: ProviderJobStatus,
    /// Raw output payload; shape varies by model (see [`normalize_outputs`]).
    pub output: serde_json::Value,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Record view
// ---------------------------------------------------------------------------

/// Coarse record lifecycle phase as seen by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPhase {
    /// `starting` or `processing` -- no terminal result recorded yet.
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

/// The slice of a generation record the planner needs.
#[derive(Debug, Clone)]
pub struct RecordView {
    pub phase: RecordPhase,
    /// Idempotency marker: true once the balance deduction and ledger
    /// entry have been committed.
    pub billing_complete: bool,
    /// Number of permanent output URLs already persisted.
    pub stored_output_count: usize,
    /// Per-unit cost estimate fixed at dispatch time.
    pub cost_cents: i64,
    /// Whether the final charge multiplies by actual output count.
    pub scales_with_outputs: bool,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Error text recorded when a success report carries no usable output.
pub const NO_OUTPUT_ERROR: &str = "Provider reported success but returned no usable output URL";

/// What the executor should do with a provider result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizePlan {
    /// Nothing to do (duplicate delivery, already terminal, stale event).
    Ignore { reason: &'static str },
    /// Record that the provider has started work.
    MarkProcessing,
    /// Terminal failure; no billing.
    MarkFailed { error: String },
    /// Provider-side cancellation; terminal, no billing.
    MarkCanceled { error: Option<String> },
    /// First successful completion: archive these URLs, persist outputs,
    /// then run the exactly-once billing step for `final_cost_cents`.
    Complete {
        urls: Vec<String>,
        final_cost_cents: i64,
    },
    /// The record already succeeded but billing never completed (e.g. a
    /// deduction failure at webhook time). Re-run billing only; outputs
    /// are already persisted and must not be re-archived.
    RecoverBilling { final_cost_cents: i64 },
}

/// Decide how to apply a provider result to a generation record.
pub fn plan_finalize(record: &RecordView, result: &ProviderResult) -> FinalizePlan {
    match result.status {
        ProviderJobStatus::Starting | ProviderJobStatus::Processing => {
            if record.phase == RecordPhase::Pending {
                FinalizePlan::MarkProcessing
            } else {
                FinalizePlan::Ignore {
                    reason: "progress event for a terminal record",
                }
            }
        }

        ProviderJobStatus::Failed => match record.phase {
            RecordPhase::Failed => FinalizePlan::Ignore {
                reason: "record already failed",
            },
            _ => FinalizePlan::MarkFailed {
                error: result
                    .error
                    .clone()
                    .unwrap_or_else(|| "Generation failed".to_string()),
            },
        },

        ProviderJobStatus::Canceled => match record.phase {
            RecordPhase::Failed | RecordPhase::Canceled => FinalizePlan::Ignore {
                reason: "record already terminal",
            },
            _ => FinalizePlan::MarkCanceled {
                error: result.error.clone(),
            },
        },

        ProviderJobStatus::Succeeded => match record.phase {
            RecordPhase::Failed | RecordPhase::Canceled => FinalizePlan::Ignore {
                reason: "success report for a failed record",
            },
            RecordPhase::Succeeded if record.billing_complete => FinalizePlan::Ignore {
                reason: "duplicate delivery, already billed",
            },
            RecordPhase::Succeeded => FinalizePlan::RecoverBilling {
                final_cost_cents: final_cost_cents(
                    record.cost_cents,
                    record.stored_output_count,
                    record.scales_with_outputs,
                ),
            },
            RecordPhase::Pending => {
                let urls = normalize_outputs(&result.output);
                if urls.is_empty() {
                    FinalizePlan::MarkFailed {
                        error: NO_OUTPUT_ERROR.to_string(),
                    }
                } else {
                    let final_cost = final_cost_cents(
                        record.cost_cents,
                        urls.len(),
                        record.scales_with_outputs,
                    );
                    FinalizePlan::Complete {
                        urls,
                        final_cost_cents: final_cost,
                    }
                }
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending_record() -> RecordView {
        RecordView {
            phase: RecordPhase::Pending,
            billing_complete: false,
            stored_output_count: 0,
            cost_cents: 65,
            scales_with_outputs: false,
        }
    }

    fn succeeded(output: serde_json::Value) -> ProviderResult {
        ProviderResult {
            status: ProviderJobStatus::Succeeded,
            output,
            error: None,
        }
    }

    // -- status parsing ----------------------------------------------------

    #[test]
    fn status_parse_roundtrip() {
        for s in ["starting", "processing", "succeeded", "failed", "canceled"] {
            assert_eq!(ProviderJobStatus::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(ProviderJobStatus::parse("queued"), None);
    }

    // -- progress events ---------------------------------------------------

    #[test]
    fn processing_event_marks_processing() {
        let plan = plan_finalize(
            &pending_record(),
            &ProviderResult {
                status: ProviderJobStatus::Processing,
                output: json!(null),
                error: None,
            },
        );
        assert_eq!(plan, FinalizePlan::MarkProcessing);
    }

    #[test]
    fn late_progress_event_is_ignored() {
        let record = RecordView {
            phase: RecordPhase::Succeeded,
            billing_complete: true,
            stored_output_count: 1,
            ..pending_record()
        };
        let plan = plan_finalize(
            &record,
            &ProviderResult {
                status: ProviderJobStatus::Starting,
                output: json!(null),
                error: None,
            },
        );
        assert!(matches!(plan, FinalizePlan::Ignore { .. }));
    }

    // -- first success -----------------------------------------------------

    #[test]
    fn first_success_completes_with_urls() {
        let plan = plan_finalize(
            &pending_record(),
            &succeeded(json!(["https://x.test/1.png", "https://x.test/2.png"])),
        );
        match plan {
            FinalizePlan::Complete {
                urls,
                final_cost_cents,
            } => {
                assert_eq!(urls.len(), 2);
                // Non-scaling model: estimate unchanged by output count.
                assert_eq!(final_cost_cents, 65);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn scaling_model_multiplies_by_output_count() {
        let record = RecordView {
            cost_cents: 7,
            scales_with_outputs: true,
            ..pending_record()
        };
        let plan = plan_finalize(
            &record,
            &succeeded(json!([
                "https://x.test/1.png",
                "https://x.test/2.png",
                "https://x.test/3.png"
            ])),
        );
        assert!(matches!(plan, FinalizePlan::Complete { final_cost_cents: 21, .. }));
    }

    #[test]
    fn success_without_output_fails_without_billing() {
        let plan = plan_finalize(&pending_record(), &succeeded(json!(null)));
        assert_eq!(
            plan,
            FinalizePlan::MarkFailed {
                error: NO_OUTPUT_ERROR.to_string()
            }
        );
    }

    #[test]
    fn success_with_only_garbage_output_fails() {
        let plan = plan_finalize(&pending_record(), &succeeded(json!(["nope", 3])));
        assert!(matches!(plan, FinalizePlan::MarkFailed { .. }));
    }

    // -- duplicate deliveries ----------------------------------------------

    #[test]
    fn duplicate_success_after_billing_is_ignored() {
        let record = RecordView {
            phase: RecordPhase::Succeeded,
            billing_complete: true,
            stored_output_count: 1,
            ..pending_record()
        };
        let plan = plan_finalize(&record, &succeeded(json!("https://x.test/1.png")));
        assert!(matches!(plan, FinalizePlan::Ignore { .. }));
    }

    #[test]
    fn success_on_failed_record_is_ignored() {
        let record = RecordView {
            phase: RecordPhase::Failed,
            ..pending_record()
        };
        let plan = plan_finalize(&record, &succeeded(json!("https://x.test/1.png")));
        assert!(matches!(plan, FinalizePlan::Ignore { .. }));
    }

    // -- billing recovery --------------------------------------------------

    #[test]
    fn unbilled_success_recovers_billing_from_stored_outputs() {
        let record = RecordView {
            phase: RecordPhase::Succeeded,
            billing_complete: false,
            stored_output_count: 3,
            cost_cents: 7,
            scales_with_outputs: true,
        };
        // Output payload is irrelevant in recovery; stored count wins.
        let plan = plan_finalize(&record, &succeeded(json!(null)));
        assert_eq!(plan, FinalizePlan::RecoverBilling { final_cost_cents: 21 });
    }

    #[test]
    fn recovery_with_fixed_cost_model() {
        let record = RecordView {
            phase: RecordPhase::Succeeded,
            billing_complete: false,
            stored_output_count: 1,
            ..pending_record()
        };
        let plan = plan_finalize(&record, &succeeded(json!(null)));
        assert_eq!(plan, FinalizePlan::RecoverBilling { final_cost_cents: 65 });
    }

    // -- failures and cancellations ----------------------------------------

    #[test]
    fn failure_records_provider_error() {
        let plan = plan_finalize(
            &pending_record(),
            &ProviderResult {
                status: ProviderJobStatus::Failed,
                output: json!(null),
                error: Some("NSFW content detected".into()),
            },
        );
        assert_eq!(
            plan,
            FinalizePlan::MarkFailed {
                error: "NSFW content detected".to_string()
            }
        );
    }

    #[test]
    fn repeated_failure_is_ignored() {
        let record = RecordView {
            phase: RecordPhase::Failed,
            ..pending_record()
        };
        let plan = plan_finalize(
            &record,
            &ProviderResult {
                status: ProviderJobStatus::Failed,
                output: json!(null),
                error: Some("boom".into()),
            },
        );
        assert!(matches!(plan, FinalizePlan::Ignore { .. }));
    }

    #[test]
    fn cancellation_is_terminal_and_unbilled() {
        let plan = plan_finalize(
            &pending_record(),
            &ProviderResult {
                status: ProviderJobStatus::Canceled,
                output: json!(null),
                error: None,
            },
        );
        assert_eq!(plan, FinalizePlan::MarkCanceled { error: None });
    }

    #[test]
    fn webhook_and_poll_paths_agree() {
        // The same inputs always produce the same plan regardless of how
        // the provider result was obtained.
        let record = pending_record();
        let result = succeeded(json!("https://x.test/out.png"));
        assert_eq!(plan_finalize(&record, &result), plan_finalize(&record, &result));
    }
}
