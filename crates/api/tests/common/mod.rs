//! Shared test harness: builds the full application router over a test
//! database pool, using the same middleware stack as production.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;

use skinny_api::config::ServerConfig;
use skinny_api::router::build_app_router;
use skinny_api::settings::SettingsCache;
use skinny_api::state::AppState;
use skinny_storage::{MediaArchiver, MemoryObjectStore};

/// Admin bearer token used by the test config.
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:3000".to_string(),
        admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
        s3_endpoint_url: None,
        s3_public_base_url: "http://localhost:9000".to_string(),
        image_bucket: "skinny-images".to_string(),
        video_bucket: "skinny-videos".to_string(),
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
///
/// Media storage is in-memory, and the provider client points at a
/// closed local port so no test can accidentally reach the real API.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let store = Arc::new(MemoryObjectStore::new());
    let archiver = Arc::new(MediaArchiver::new(
        store,
        config.image_bucket.clone(),
        config.video_bucket.clone(),
    ));

    let replicate = Arc::new(skinny_replicate::ReplicateClient::with_base_url(
        "http://127.0.0.1:1".to_string(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        replicate,
        archiver,
        settings: Arc::new(SettingsCache::new()),
    };

    build_app_router(state, &config)
}

/// Issue a GET request against the app.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    request(app, "GET", uri, None, &[]).await
}

/// Issue a GET request with extra headers.
pub async fn get_with_headers(
    app: &Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> Response<Body> {
    request(app, "GET", uri, None, headers).await
}

/// Issue a JSON request with extra headers.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
    headers: &[(&str, &str)],
) -> Response<Body> {
    request(app, method, uri, Some(body.to_string()), headers).await
}

/// Issue a request with a raw (pre-serialized) body.
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: String,
    headers: &[(&str, &str)],
) -> Response<Body> {
    request(app, method, uri, Some(body), headers).await
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<String>,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .expect("failed to build request");

    app.clone()
        .oneshot(request)
        .await
        .expect("request infallible")
}

/// Collect a response body into parsed JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is not valid JSON")
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

use skinny_db::models::generation::{CreateGeneration, Generation};
use skinny_db::models::profile::{CreateProfile, Profile};
use skinny_db::repositories::{GenerationRepo, ProfileRepo};

/// Insert a profile with the given balance and lifetime flag.
pub async fn seed_profile(
    pool: &PgPool,
    platform_user_id: &str,
    balance_cents: i64,
    lifetime_access: bool,
) -> Profile {
    ProfileRepo::create(
        pool,
        &CreateProfile {
            platform_user_id: platform_user_id.to_string(),
            display_name: None,
            balance_cents,
            lifetime_access,
        },
    )
    .await
    .expect("failed to seed profile")
}

/// Insert a dispatched generation (status `starting`, provider job id set).
pub async fn seed_generation(
    pool: &PgPool,
    profile_id: i64,
    provider_job_id: &str,
    cost_cents: i64,
    scales_with_outputs: bool,
) -> Generation {
    let generation = GenerationRepo::create(
        pool,
        &CreateGeneration {
            profile_id,
            model_slug: "kling-v2".to_string(),
            model_category: "video".to_string(),
            prompt: "a fox leaping over a frozen river".to_string(),
            duration_seconds: Some(5),
            resolution: Some("720p".to_string()),
            generate_audio: None,
            sequential_mode: None,
            max_images: None,
            cost_cents,
            scales_with_outputs,
        },
    )
    .await
    .expect("failed to seed generation");

    GenerationRepo::set_provider_job_id(pool, generation.id, provider_job_id)
        .await
        .expect("failed to set provider job id");

    GenerationRepo::find_by_id(pool, generation.id)
        .await
        .expect("failed to reload generation")
        .expect("seeded generation missing")
}
