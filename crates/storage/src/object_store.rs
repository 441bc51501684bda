//! Blob storage backends behind a provider trait.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

/// Error type for object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The upload did not complete.
    #[error("Upload failed: {0}")]
    Upload(String),
}

/// A blob storage backend.
///
/// Implementations return the public URL of the stored object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `bucket`/`key`, returning the public URL.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

/// S3-compatible object store (AWS S3, MinIO, R2).
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    /// Base URL prefixed to `bucket/key` for public links.
    public_base_url: String,
}

impl S3ObjectStore {
    /// Build a store from ambient AWS configuration.
    ///
    /// `endpoint_url` overrides the endpoint for S3-compatible services;
    /// path-style addressing is forced so bucket names need no DNS setup.
    pub async fn connect(endpoint_url: Option<&str>, public_base_url: String) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            public_base_url,
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{bucket}/{key}",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(self.public_url(bucket, key))
    }
}

// ---------------------------------------------------------------------------
// In-memory (tests)
// ---------------------------------------------------------------------------

/// In-memory object store for tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_puts: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every upload fails, for exercising fallback paths.
    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_puts: true,
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a stored object's bytes and content type.
    pub fn get(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .get(&format!("{bucket}/{key}"))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail_puts {
            return Err(StorageError::Upload("simulated upload failure".into()));
        }
        self.objects
            .lock()
            .expect("store lock poisoned")
            .insert(format!("{bucket}/{key}"), (bytes, content_type.to_string()));
        Ok(format!("memory://{bucket}/{key}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
