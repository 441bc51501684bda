//! Platform-wide settings singleton (provider credentials).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use skinny_core::types::{DbId, Timestamp};

/// The single `platform_settings` row (id is always 1, seeded by
/// migration). Secrets live here so admins can rotate them at runtime;
/// the API layer caches a snapshot and invalidates on update.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlatformSettings {
    pub id: DbId,
    /// Replicate API token used for dispatch and status polls.
    pub replicate_api_token: Option<String>,
    /// Shared secret for inbound webhook HMAC verification. When unset,
    /// verification is skipped (permissive dev mode).
    pub webhook_signing_secret: Option<String>,
    /// Gemini API key for the chat orchestration proxy.
    pub gemini_api_key: Option<String>,
    pub updated_at: Timestamp,
}

/// Patch DTO for updating settings; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePlatformSettings {
    pub replicate_api_token: Option<String>,
    pub webhook_signing_secret: Option<String>,
    pub gemini_api_key: Option<String>,
}
