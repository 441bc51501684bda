//! Repository for the `platform_settings` singleton row.

use sqlx::PgPool;

use crate::models::platform_settings::{PlatformSettings, UpdatePlatformSettings};

/// Column list for platform_settings queries.
const COLUMNS: &str =
    "id, replicate_api_token, webhook_signing_secret, gemini_api_key, updated_at";

/// Primary key of the singleton row (seeded by migration).
const SINGLETON_ID: i64 = 1;

/// Provides read/update access to the platform settings singleton.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Fetch the settings row. The row is seeded by migration, so a
    /// missing row indicates a broken schema and surfaces as an error.
    pub async fn get(pool: &PgPool) -> Result<PlatformSettings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM platform_settings WHERE id = $1");
        sqlx::query_as::<_, PlatformSettings>(&query)
            .bind(SINGLETON_ID)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update; absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        input: &UpdatePlatformSettings,
    ) -> Result<PlatformSettings, sqlx::Error> {
        let query = format!(
            "UPDATE platform_settings
             SET replicate_api_token = COALESCE($2, replicate_api_token),
                 webhook_signing_secret = COALESCE($3, webhook_signing_secret),
                 gemini_api_key = COALESCE($4, gemini_api_key),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlatformSettings>(&query)
            .bind(SINGLETON_ID)
            .bind(&input.replicate_api_token)
            .bind(&input.webhook_signing_secret)
            .bind(&input.gemini_api_key)
            .fetch_one(pool)
            .await
    }
}
