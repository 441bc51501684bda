//! Media archival: transient provider URL -> durable object storage.

use std::sync::Arc;
use std::time::Duration;

use skinny_core::media::{self, MediaKind};
use skinny_core::types::DbId;

use crate::object_store::{ObjectStore, StorageError};

/// Timeout covering the download of one output file.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Content type recorded when the provider response carries none.
fn default_content_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "video/mp4",
        MediaKind::Image => "image/webp",
    }
}

/// Internal error for a single archival attempt.
#[derive(Debug, thiserror::Error)]
enum ArchiveError {
    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error(transparent)]
    Upload(#[from] StorageError),
}

/// Re-hosts provider output files into durable object storage.
///
/// Archival is best-effort: any failure returns the original transient
/// URL so the generation is never lost, with a loud log so the
/// degradation is observable.
pub struct MediaArchiver {
    http: reqwest::Client,
    store: Arc<dyn ObjectStore>,
    image_bucket: String,
    video_bucket: String,
}

impl MediaArchiver {
    pub fn new(store: Arc<dyn ObjectStore>, image_bucket: String, video_bucket: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            store,
            image_bucket,
            video_bucket,
        }
    }

    /// Download `transient_url` and re-upload it under the owner's
    /// namespace, returning the permanent public URL.
    ///
    /// On any failure the transient URL is returned unchanged -- provider
    /// URLs keep working for a limited window, and losing the output over
    /// an archival hiccup is the worse trade.
    pub async fn archive(&self, transient_url: &str, owner: Option<DbId>) -> String {
        match self.try_archive(transient_url, owner).await {
            Ok(permanent_url) => {
                tracing::info!(
                    transient_url,
                    permanent_url = %permanent_url,
                    "Archived generation output"
                );
                permanent_url
            }
            Err(e) => {
                tracing::error!(
                    transient_url,
                    error = %e,
                    "Failed to archive output, falling back to transient URL"
                );
                transient_url.to_string()
            }
        }
    }

    async fn try_archive(
        &self,
        url: &str,
        owner: Option<DbId>,
    ) -> Result<String, ArchiveError> {
        let response = self.http.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;

        let kind = media::classify(content_type.as_deref(), url);
        let extension = media::extension_for(content_type.as_deref(), kind);
        let key = media::object_key(owner, extension);
        let bucket = match kind {
            MediaKind::Video => &self.video_bucket,
            MediaKind::Image => &self.image_bucket,
        };

        let public_url = self
            .store
            .put(
                bucket,
                &key,
                bytes.to_vec(),
                content_type.as_deref().unwrap_or(default_content_type(kind)),
            )
            .await?;
        Ok(public_url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
