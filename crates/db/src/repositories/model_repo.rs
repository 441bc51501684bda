//! Repository for the `models` table (generation model catalog).

use sqlx::PgPool;

use crate::models::model::Model;

/// Column list for models queries.
const COLUMNS: &str = "id, slug, display_name, provider_version, category, \
    is_active, pricing_type, cost_per_run_cents, cost_per_second_cents, \
    cost_per_second_with_audio_cents, duration_options, default_duration_seconds, \
    resolution_options, default_resolution, resolution_multipliers, \
    supports_audio, supports_sequential, max_sequential_images, \
    scales_with_outputs, created_at";

/// Provides read access to the model catalog. Rows are managed by
/// migrations and the admin surface, not by end-user requests.
pub struct ModelRepo;

impl ModelRepo {
    /// Find an active model by its client-facing slug.
    pub async fn find_active_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Model>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM models WHERE slug = $1 AND is_active = TRUE");
        sqlx::query_as::<_, Model>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List all active models, alphabetical by slug.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Model>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM models WHERE is_active = TRUE ORDER BY slug");
        sqlx::query_as::<_, Model>(&query).fetch_all(pool).await
    }
}
