use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skinny_api::config::ServerConfig;
use skinny_api::router::build_app_router;
use skinny_api::settings::SettingsCache;
use skinny_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skinny_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = skinny_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    skinny_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    skinny_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Media storage ---
    let object_store = Arc::new(
        skinny_storage::S3ObjectStore::connect(
            config.s3_endpoint_url.as_deref(),
            config.s3_public_base_url.clone(),
        )
        .await,
    );
    let archiver = Arc::new(skinny_storage::MediaArchiver::new(
        object_store,
        config.image_bucket.clone(),
        config.video_bucket.clone(),
    ));
    tracing::info!(
        image_bucket = %config.image_bucket,
        video_bucket = %config.video_bucket,
        "Media archiver ready"
    );

    // --- Provider client ---
    let replicate = Arc::new(skinny_replicate::ReplicateClient::new());

    // --- Settings cache ---
    let settings = Arc::new(SettingsCache::new());
    match settings.get(&pool).await {
        Ok(snapshot) if snapshot.webhook_signing_secret.is_none() => {
            tracing::warn!(
                "Webhook signature verification is DISABLED (no signing secret configured); \
                 acceptable for local development only"
            );
        }
        Ok(_) => tracing::info!("Webhook signature verification enabled"),
        Err(e) => panic!("Failed to load platform settings: {e}"),
    }

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        replicate,
        archiver,
        settings,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
