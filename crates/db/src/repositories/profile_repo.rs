//! Repository for the `profiles` table.
//!
//! Balance mutations go exclusively through [`ProfileRepo::try_deduct`]
//! and [`ProfileRepo::credit`], both single conditional statements, so
//! concurrent charges can never interleave into a negative balance.

use sqlx::PgPool;
use skinny_core::types::DbId;

use crate::models::profile::{CreateProfile, Profile};

/// Column list for profiles queries.
const COLUMNS: &str =
    "id, platform_user_id, display_name, balance_cents, lifetime_access, created_at, updated_at";

/// Result of a conditional balance deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductOutcome {
    /// The deduction applied; carries the post-deduction balance.
    Applied { new_balance_cents: i64 },
    /// The balance could not cover the amount; nothing changed.
    InsufficientBalance,
}

/// Provides CRUD and atomic balance operations for user profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Insert a new profile, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProfile) -> Result<Profile, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (platform_user_id, display_name, balance_cents, lifetime_access)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(&input.platform_user_id)
            .bind(&input.display_name)
            .bind(input.balance_cents)
            .bind(input.lifetime_access)
            .fetch_one(pool)
            .await
    }

    /// Find a profile by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a profile by the external platform user id.
    pub async fn find_by_platform_user_id(
        pool: &PgPool,
        platform_user_id: &str,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE platform_user_id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(platform_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically deduct `amount_cents` if the balance covers it.
    ///
    /// Single compare-and-decrement statement; the WHERE clause is the
    /// sufficiency check, so two concurrent deductions can never both
    /// succeed against the same cents. The caller resolves lifetime
    /// access before calling; `amount_cents` must be non-negative.
    pub async fn try_deduct(
        pool: &PgPool,
        profile_id: DbId,
        amount_cents: i64,
    ) -> Result<DeductOutcome, sqlx::Error> {
        debug_assert!(amount_cents >= 0, "deduction amounts are non-negative");

        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE profiles
             SET balance_cents = balance_cents - $2, updated_at = NOW()
             WHERE id = $1 AND balance_cents >= $2
             RETURNING balance_cents",
        )
        .bind(profile_id)
        .bind(amount_cents)
        .fetch_optional(pool)
        .await?;

        Ok(match row {
            Some((new_balance_cents,)) => DeductOutcome::Applied { new_balance_cents },
            None => DeductOutcome::InsufficientBalance,
        })
    }

    /// Atomically add `amount_cents` to the balance (top-up path).
    /// Returns the new balance, or `None` if the profile does not exist.
    pub async fn credit(
        pool: &PgPool,
        profile_id: DbId,
        amount_cents: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        debug_assert!(amount_cents >= 0, "credit amounts are non-negative");

        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE profiles
             SET balance_cents = balance_cents + $2, updated_at = NOW()
             WHERE id = $1
             RETURNING balance_cents",
        )
        .bind(profile_id)
        .bind(amount_cents)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(balance,)| balance))
    }
}
