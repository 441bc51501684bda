//! The Replicate API client.

use std::time::Duration;

use crate::types::{CreatePredictionRequest, Prediction};

/// Production API base URL.
const API_BASE_URL: &str = "https://api.replicate.com/v1";

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the Replicate API client.
#[derive(Debug, thiserror::Error)]
pub enum ReplicateError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Replicate API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the Replicate prediction API.
///
/// The API token is passed per call rather than held by the client: the
/// token is platform-level configuration that admins can rotate at
/// runtime, and the settings cache is the single source of truth for it.
pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReplicateClient {
    /// Create a client targeting the production API.
    pub fn new() -> Self {
        Self::with_base_url(API_BASE_URL.to_string())
    }

    /// Create a client targeting a custom base URL (tests, proxies).
    pub fn with_base_url(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { http, base_url }
    }

    /// Create a prediction, requesting asynchronous webhook callbacks.
    pub async fn create_prediction(
        &self,
        token: &str,
        request: &CreatePredictionRequest,
    ) -> Result<Prediction, ReplicateError> {
        let url = format!("{}/predictions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch the current state of a prediction (manual recovery path).
    pub async fn get_prediction(
        &self,
        token: &str,
        prediction_id: &str,
    ) -> Result<Prediction, ReplicateError> {
        let url = format!("{}/predictions/{prediction_id}", self.base_url);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        Self::parse_response(response).await
    }

    /// Decode a response, mapping non-2xx statuses to [`ReplicateError::Api`].
    async fn parse_response(response: reqwest::Response) -> Result<Prediction, ReplicateError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "Replicate API error");
            return Err(ReplicateError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<Prediction>().await?)
    }
}

impl Default for ReplicateClient {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_panic() {
        let _client = ReplicateClient::new();
    }

    #[test]
    fn custom_base_url_is_used() {
        let client = ReplicateClient::with_base_url("http://localhost:9999".into());
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn api_error_display() {
        let err = ReplicateError::Api {
            status: 402,
            message: "payment required".into(),
        };
        assert_eq!(
            err.to_string(),
            "Replicate API returned HTTP 402: payment required"
        );
    }
}
