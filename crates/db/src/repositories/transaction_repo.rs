//! Repository for the `transactions` table (append-only ledger).

use sqlx::PgPool;
use skinny_core::types::DbId;

use crate::models::transaction::{CreateTransaction, Transaction};

/// Column list for transactions queries.
const COLUMNS: &str = "id, profile_id, generation_id, amount_cents, tx_type, \
    label, status, preview_url, metadata, created_at";

/// Provides append and read operations for ledger transactions.
/// Rows are never updated or deleted.
pub struct TransactionRepo;

impl TransactionRepo {
    /// Append a ledger row, returning the created transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTransaction,
    ) -> Result<Transaction, sqlx::Error> {
        let query = format!(
            "INSERT INTO transactions
                (profile_id, generation_id, amount_cents, tx_type, label,
                 status, preview_url, metadata)
             VALUES ($1, $2, $3, $4, $5, 'completed', $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(input.profile_id)
            .bind(input.generation_id)
            .bind(input.amount_cents)
            .bind(&input.tx_type)
            .bind(&input.label)
            .bind(&input.preview_url)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// List a profile's transactions, newest first.
    pub async fn list_for_profile(
        pool: &PgPool,
        profile_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transactions
             WHERE profile_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(profile_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count transactions settling a specific generation.
    /// Exactly one exists after a successful billing step.
    pub async fn count_for_generation(
        pool: &PgPool,
        generation_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE generation_id = $1")
                .bind(generation_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
