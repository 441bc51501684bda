//! Ledger transaction entity (append-only audit records).

use serde::Serialize;
use sqlx::FromRow;
use skinny_core::types::{DbId, Timestamp};

/// Transaction type tag for generation charges.
pub const TX_TYPE_GENERATION: &str = "generation";

/// Transaction type tag for credit top-ups.
pub const TX_TYPE_TOPUP: &str = "topup";

/// An immutable ledger row from the `transactions` table.
///
/// Amounts are signed: negative for debits (generation charges),
/// positive for credits (top-ups).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: DbId,
    pub profile_id: DbId,
    /// The generation this charge settles, when applicable. A partial
    /// unique index enforces at most one transaction per generation.
    pub generation_id: Option<DbId>,
    pub amount_cents: i64,
    pub tx_type: String,
    /// Human-readable task label (e.g. a truncated prompt).
    pub label: String,
    pub status: String,
    /// First output URL, for ledger previews.
    pub preview_url: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// Input for appending a ledger row.
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub profile_id: DbId,
    pub generation_id: Option<DbId>,
    pub amount_cents: i64,
    pub tx_type: String,
    pub label: String,
    pub preview_url: Option<String>,
    pub metadata: serde_json::Value,
}
