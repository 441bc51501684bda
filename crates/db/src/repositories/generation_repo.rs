//! Repository for the `generations` table.
//!
//! Rows are append-then-patch: created at dispatch, mutated by the
//! finalize path, never deleted. The billing idempotency marker lives in
//! the `metadata` JSONB column and is claimed with a single conditional
//! write ([`GenerationRepo::try_claim_billing`]) so concurrent webhook
//! deliveries cannot both enter the billing step.

use sqlx::PgPool;
use skinny_core::types::DbId;

use crate::models::generation::{CreateGeneration, Generation, GenerationStatus};

/// Column list for generations queries.
const COLUMNS: &str = "id, profile_id, model_slug, model_category, prompt, \
    duration_seconds, resolution, generate_audio, sequential_mode, max_images, \
    provider_job_id, status, output_urls, cost_cents, total_cost_cents, \
    scales_with_outputs, metadata, error, created_at, started_at, completed_at";

/// Provides lifecycle operations for generation records.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a new record in status `starting`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGeneration,
    ) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations
                (profile_id, model_slug, model_category, prompt,
                 duration_seconds, resolution, generate_audio,
                 sequential_mode, max_images, cost_cents, scales_with_outputs)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(input.profile_id)
            .bind(&input.model_slug)
            .bind(&input.model_category)
            .bind(&input.prompt)
            .bind(input.duration_seconds)
            .bind(&input.resolution)
            .bind(input.generate_audio)
            .bind(&input.sequential_mode)
            .bind(input.max_images)
            .bind(input.cost_cents)
            .bind(input.scales_with_outputs)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generations WHERE id = $1");
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a record by the provider's job id.
    ///
    /// `None` is not an error: webhooks can fire for jobs this service
    /// never created (test traffic, unrelated tenants), and the caller
    /// acknowledges those instead of failing.
    pub async fn find_by_provider_job_id(
        pool: &PgPool,
        provider_job_id: &str,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generations WHERE provider_job_id = $1");
        sqlx::query_as::<_, Generation>(&query)
            .bind(provider_job_id)
            .fetch_optional(pool)
            .await
    }

    /// Attach the provider job id once dispatch has been accepted.
    pub async fn set_provider_job_id(
        pool: &PgPool,
        id: DbId,
        provider_job_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE generations SET provider_job_id = $2 WHERE id = $1")
            .bind(id)
            .bind(provider_job_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record that the provider has started work. Only applies while the
    /// record is still pending; `started_at` is set once.
    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations
             SET status = 'processing', started_at = COALESCE(started_at, NOW())
             WHERE id = $1 AND status IN ('starting', 'processing')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Move a record into a terminal non-success status with error text.
    pub async fn mark_terminal(
        pool: &PgPool,
        id: DbId,
        status: GenerationStatus,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations
             SET status = $2, error = $3, completed_at = COALESCE(completed_at, NOW())
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Persist the permanent output URLs and final cost, marking the
    /// record succeeded.
    pub async fn complete_outputs(
        pool: &PgPool,
        id: DbId,
        output_urls: &[String],
        total_cost_cents: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations
             SET status = 'succeeded',
                 output_urls = $2,
                 total_cost_cents = $3,
                 completed_at = COALESCE(completed_at, NOW())
             WHERE id = $1",
        )
        .bind(id)
        .bind(output_urls)
        .bind(total_cost_cents)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Claim the billing step for this record.
    ///
    /// One conditional write: flips `billing_complete` to true only if it
    /// is not already true, and reports whether this caller won. Losing
    /// the claim means another delivery is billing (or has billed) the
    /// record, and the caller must not charge.
    pub async fn try_claim_billing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generations
             SET metadata = metadata || jsonb_build_object('billing_complete', true)
             WHERE id = $1
               AND COALESCE(metadata->>'billing_complete', 'false') <> 'true'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release a billing claim after a failed deduction so a later
    /// redelivery or manual check can retry the charge.
    pub async fn release_billing_claim(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations
             SET metadata = metadata || jsonb_build_object('billing_complete', false)
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record the committed charge details alongside the claim.
    pub async fn record_billing(
        pool: &PgPool,
        id: DbId,
        billed_amount_cents: i64,
        billed_via: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations
             SET metadata = metadata || jsonb_build_object(
                 'billing_complete', true,
                 'billed_at', NOW(),
                 'billed_amount_cents', $2::BIGINT,
                 'billed_via', $3::TEXT)
             WHERE id = $1",
        )
        .bind(id)
        .bind(billed_amount_cents)
        .bind(billed_via)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List a profile's generations, newest first.
    pub async fn list_for_profile(
        pool: &PgPool,
        profile_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Generation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generations
             WHERE profile_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(profile_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
