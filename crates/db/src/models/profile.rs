//! User profile model and DTOs.
//!
//! The internal `id` is the canonical foreign key for all generation and
//! ledger relationships; `platform_user_id` is the external commerce
//! platform's identifier and is used only for request auth lookup and
//! display.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use skinny_core::types::{DbId, Timestamp};

/// A user profile row from the `profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: DbId,
    /// External platform user id (unique, lookup/display only).
    pub platform_user_id: String,
    pub display_name: Option<String>,
    /// Credit balance in cents; never negative (enforced by the
    /// conditional decrement and a CHECK constraint).
    pub balance_cents: i64,
    /// Exempts the user from per-generation charges.
    pub lifetime_access: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for provisioning a new profile.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfile {
    pub platform_user_id: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub balance_cents: i64,
    #[serde(default)]
    pub lifetime_access: bool,
}
