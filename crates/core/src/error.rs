//! Domain error type shared across all crates.

use crate::types::DbId;

/// Domain-level error for core and repository operations.
///
/// The API layer maps each variant onto an HTTP status and a
/// machine-readable error code (see `skinny_api::error::AppError`).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity referenced by id does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The operation conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// The caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// The caller's balance cannot cover the worst-case charge.
    #[error("Insufficient balance: {required_cents} cents required, {available_cents} available")]
    InsufficientBalance {
        required_cents: i64,
        available_cents: i64,
    },

    /// An unexpected internal failure.
    #[error("{0}")]
    Internal(String),
}
