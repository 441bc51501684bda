//! In-process cache for the platform settings singleton.
//!
//! Settings hold provider credentials that admins can rotate at runtime.
//! Handlers read through [`SettingsCache::get`]; the admin update path
//! calls [`SettingsCache::invalidate`] after writing, so the next read
//! reloads from the database. Lifetime and invalidation ordering are
//! explicit rather than hidden in a module-level static.

use std::sync::Arc;

use skinny_db::models::platform_settings::PlatformSettings;
use skinny_db::repositories::SettingsRepo;
use skinny_db::DbPool;
use tokio::sync::RwLock;

/// Cached snapshot of the `platform_settings` row.
#[derive(Default)]
pub struct SettingsCache {
    inner: RwLock<Option<Arc<PlatformSettings>>>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached settings, loading from the database on a miss.
    pub async fn get(&self, pool: &DbPool) -> Result<Arc<PlatformSettings>, sqlx::Error> {
        if let Some(settings) = self.inner.read().await.as_ref() {
            return Ok(Arc::clone(settings));
        }

        let fresh = Arc::new(SettingsRepo::get(pool).await?);
        *self.inner.write().await = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Drop the cached snapshot; the next `get` reloads.
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}
