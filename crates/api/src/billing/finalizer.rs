//! Executes finalize plans produced by `skinny_core::finalize`.
//!
//! The webhook handler and the manual status re-check both feed provider
//! results through [`Finalizer::apply`], so the two entry points cannot
//! diverge. Billing runs behind an atomic claim on the record's
//! `billing_complete` marker: duplicate deliveries lose the claim and
//! skip the charge, and a failed deduction releases the claim so a later
//! delivery or manual check can retry.
//!
//! Nothing past output persistence is allowed to fail webhook
//! processing: billing errors are logged loudly and deferred, never
//! propagated, because the provider has already produced output the
//! user must keep.

use serde_json::json;
use skinny_core::finalize::{plan_finalize, FinalizePlan, ProviderResult};
use skinny_db::models::generation::{Generation, GenerationStatus};
use skinny_db::models::transaction::{CreateTransaction, TX_TYPE_GENERATION};
use skinny_db::repositories::{DeductOutcome, GenerationRepo, ProfileRepo, TransactionRepo};
use skinny_db::DbPool;
use skinny_storage::MediaArchiver;

use crate::error::AppResult;

/// Maximum characters of prompt carried into a ledger label.
const LABEL_MAX_CHARS: usize = 80;

/// Which path invoked the finalizer; recorded as `billed_via`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeEntry {
    Webhook,
    ManualCheck,
}

impl FinalizeEntry {
    /// `billed_via` value for a first-time billing.
    fn billed_via(self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::ManualCheck => "manual_check",
        }
    }

    /// `billed_via` value for the recovery branch (record already
    /// succeeded, billing previously incomplete).
    fn recovery_billed_via(self) -> &'static str {
        match self {
            Self::Webhook => "webhook_recovery",
            Self::ManualCheck => "manual_check",
        }
    }
}

/// Applies provider results to generation records.
pub struct Finalizer<'a> {
    pool: &'a DbPool,
    archiver: &'a MediaArchiver,
}

impl<'a> Finalizer<'a> {
    pub fn new(pool: &'a DbPool, archiver: &'a MediaArchiver) -> Self {
        Self { pool, archiver }
    }

    /// Apply one provider result to a generation record.
    ///
    /// Errors are returned only for failures *before* output
    /// persistence (status patches); the billing step never propagates.
    pub async fn apply(
        &self,
        generation: &Generation,
        result: &ProviderResult,
        entry: FinalizeEntry,
    ) -> AppResult<()> {
        let plan = plan_finalize(&generation.record_view(), result);

        match plan {
            FinalizePlan::Ignore { reason } => {
                tracing::debug!(
                    generation_id = generation.id,
                    provider_status = result.status.as_str(),
                    reason,
                    "Skipping finalize"
                );
            }

            FinalizePlan::MarkProcessing => {
                GenerationRepo::mark_processing(self.pool, generation.id).await?;
                tracing::debug!(generation_id = generation.id, "Generation processing");
            }

            FinalizePlan::MarkFailed { error } => {
                GenerationRepo::mark_terminal(
                    self.pool,
                    generation.id,
                    GenerationStatus::Failed,
                    Some(&error),
                )
                .await?;
                tracing::info!(
                    generation_id = generation.id,
                    error = %error,
                    "Generation failed, no charge"
                );
            }

            FinalizePlan::MarkCanceled { error } => {
                GenerationRepo::mark_terminal(
                    self.pool,
                    generation.id,
                    GenerationStatus::Canceled,
                    error.as_deref(),
                )
                .await?;
                tracing::info!(generation_id = generation.id, "Generation canceled, no charge");
            }

            FinalizePlan::Complete {
                urls,
                final_cost_cents,
            } => {
                let mut permanent_urls = Vec::with_capacity(urls.len());
                for url in &urls {
                    permanent_urls
                        .push(self.archiver.archive(url, Some(generation.profile_id)).await);
                }

                GenerationRepo::complete_outputs(
                    self.pool,
                    generation.id,
                    &permanent_urls,
                    final_cost_cents,
                )
                .await?;
                tracing::info!(
                    generation_id = generation.id,
                    outputs = permanent_urls.len(),
                    final_cost_cents,
                    "Generation succeeded"
                );

                self.bill(generation, final_cost_cents, &permanent_urls, entry.billed_via())
                    .await;
            }

            FinalizePlan::RecoverBilling { final_cost_cents } => {
                tracing::info!(
                    generation_id = generation.id,
                    final_cost_cents,
                    "Recovering incomplete billing"
                );
                self.bill(
                    generation,
                    final_cost_cents,
                    &generation.output_urls,
                    entry.recovery_billed_via(),
                )
                .await;
            }
        }

        Ok(())
    }

    /// Run the exactly-once billing step. Never propagates: a failure
    /// here must not undo a success the user already received.
    async fn bill(
        &self,
        generation: &Generation,
        amount_cents: i64,
        output_urls: &[String],
        billed_via: &str,
    ) {
        if let Err(e) = self
            .try_bill(generation, amount_cents, output_urls, billed_via)
            .await
        {
            tracing::error!(
                generation_id = generation.id,
                profile_id = generation.profile_id,
                amount_cents,
                error = %e,
                "Billing step failed; generation stays succeeded, billing left incomplete"
            );
        }
    }

    async fn try_bill(
        &self,
        generation: &Generation,
        amount_cents: i64,
        output_urls: &[String],
        billed_via: &str,
    ) -> Result<(), sqlx::Error> {
        // Claim first: the conditional write on billing_complete is the
        // guard that makes concurrent deliveries charge at most once.
        let claimed = GenerationRepo::try_claim_billing(self.pool, generation.id).await?;
        if !claimed {
            tracing::info!(
                generation_id = generation.id,
                "Billing already claimed by another delivery, skipping"
            );
            return Ok(());
        }

        let Some(profile) = ProfileRepo::find_by_id(self.pool, generation.profile_id).await? else {
            tracing::error!(
                generation_id = generation.id,
                profile_id = generation.profile_id,
                "Profile missing at billing time, releasing claim"
            );
            GenerationRepo::release_billing_claim(self.pool, generation.id).await?;
            return Ok(());
        };

        // The lifetime-access exemption is resolved exactly here, once
        // per generation; the ledger still records an amount-0 entry.
        let charge_cents = if profile.lifetime_access {
            0
        } else {
            amount_cents
        };

        if charge_cents > 0 {
            match ProfileRepo::try_deduct(self.pool, profile.id, charge_cents).await? {
                DeductOutcome::Applied { new_balance_cents } => {
                    tracing::info!(
                        generation_id = generation.id,
                        profile_id = profile.id,
                        charge_cents,
                        new_balance_cents,
                        "Balance deducted"
                    );
                }
                DeductOutcome::InsufficientBalance => {
                    // Balance moved between dispatch and completion. The
                    // output is kept and the charge is retried by the next
                    // redelivery or manual check.
                    tracing::error!(
                        generation_id = generation.id,
                        profile_id = profile.id,
                        charge_cents,
                        balance_cents = profile.balance_cents,
                        "Deduction failed at finalize; releasing billing claim for recovery"
                    );
                    GenerationRepo::release_billing_claim(self.pool, generation.id).await?;
                    return Ok(());
                }
            }
        }

        TransactionRepo::create(
            self.pool,
            &CreateTransaction {
                profile_id: profile.id,
                generation_id: Some(generation.id),
                amount_cents: -charge_cents,
                tx_type: TX_TYPE_GENERATION.to_string(),
                label: task_label(&generation.model_category, &generation.prompt),
                preview_url: output_urls.first().cloned(),
                metadata: json!({
                    "model": generation.model_slug,
                    "billed_via": billed_via,
                    "lifetime_access": profile.lifetime_access,
                }),
            },
        )
        .await?;

        GenerationRepo::record_billing(self.pool, generation.id, charge_cents, billed_via).await?;

        tracing::info!(
            generation_id = generation.id,
            profile_id = profile.id,
            charge_cents,
            billed_via,
            "Billing complete"
        );
        Ok(())
    }
}

/// Build a human-readable ledger label from the prompt.
fn task_label(category: &str, prompt: &str) -> String {
    if prompt.chars().count() > LABEL_MAX_CHARS {
        let truncated: String = prompt.chars().take(LABEL_MAX_CHARS).collect();
        format!("{category} generation: {truncated}…")
    } else {
        format!("{category} generation: {prompt}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
