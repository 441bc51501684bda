use std::sync::Arc;

use crate::config::ServerConfig;
use crate::settings::SettingsCache;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: skinny_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation provider API client.
    pub replicate: Arc<skinny_replicate::ReplicateClient>,
    /// Media archiver (transient URL -> durable storage).
    pub archiver: Arc<skinny_storage::MediaArchiver>,
    /// Cached platform settings with explicit invalidation.
    pub settings: Arc<SettingsCache>,
}
