/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Externally reachable base URL used to build the provider's
    /// webhook callback address.
    pub public_base_url: String,
    /// Bearer token guarding the admin surface. Admin routes are
    /// disabled entirely when unset.
    pub admin_token: Option<String>,
    /// Custom S3 endpoint for S3-compatible stores (MinIO, R2).
    pub s3_endpoint_url: Option<String>,
    /// Base URL prefixed to `bucket/key` when building public media URLs.
    pub s3_public_base_url: String,
    /// Destination bucket for archived images.
    pub image_bucket: String,
    /// Destination bucket for archived videos.
    pub video_bucket: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:3000`    |
    /// | `ADMIN_TOKEN`          | unset (admin disabled)     |
    /// | `S3_ENDPOINT_URL`      | unset (AWS default)        |
    /// | `S3_PUBLIC_BASE_URL`   | `http://localhost:9000`    |
    /// | `IMAGE_BUCKET`         | `skinny-images`            |
    /// | `VIDEO_BUCKET`         | `skinny-videos`            |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|s| !s.is_empty());

        let s3_endpoint_url = std::env::var("S3_ENDPOINT_URL").ok().filter(|s| !s.is_empty());

        let s3_public_base_url =
            std::env::var("S3_PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:9000".into());

        let image_bucket =
            std::env::var("IMAGE_BUCKET").unwrap_or_else(|_| "skinny-images".into());

        let video_bucket =
            std::env::var("VIDEO_BUCKET").unwrap_or_else(|_| "skinny-videos".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url,
            admin_token,
            s3_endpoint_url,
            s3_public_base_url,
            image_bucket,
            video_bucket,
        }
    }

    /// The webhook callback URL handed to the generation provider.
    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.public_base_url)
    }
}
