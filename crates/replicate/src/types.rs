//! Request/response types for the Replicate prediction API.

use serde::{Deserialize, Serialize};
use skinny_core::finalize::{ProviderJobStatus, ProviderResult};

/// Webhook event filter requesting only the transitions we act on.
pub const WEBHOOK_EVENTS: &[&str] = &["start", "completed"];

/// Body for `POST /predictions`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePredictionRequest {
    /// Provider model version reference.
    pub version: String,
    /// Model-specific input payload (prompt, duration, resolution, ...).
    pub input: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub webhook_events_filter: Vec<String>,
}

impl CreatePredictionRequest {
    /// Build a request with the standard webhook event filter.
    pub fn new(version: String, input: serde_json::Value, webhook: Option<String>) -> Self {
        let webhook_events_filter = if webhook.is_some() {
            WEBHOOK_EVENTS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };
        Self {
            version,
            input,
            webhook,
            webhook_events_filter,
        }
    }
}

/// A prediction as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: ProviderJobStatus,
    /// Output payload; shape varies by model.
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    /// Provider-reported timing/billing metrics, passed through opaquely.
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
}

impl Prediction {
    /// Convert into the provider-agnostic result consumed by the
    /// finalize state machine.
    pub fn into_provider_result(self) -> ProviderResult {
        ProviderResult {
            status: self.status,
            output: self.output,
            error: self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_deserializes_minimal_payload() {
        let p: Prediction =
            serde_json::from_str(r#"{"id": "pred-1", "status": "processing"}"#).unwrap();
        assert_eq!(p.id, "pred-1");
        assert_eq!(p.status, ProviderJobStatus::Processing);
        assert!(p.output.is_null());
        assert!(p.error.is_none());
    }

    #[test]
    fn prediction_deserializes_full_payload() {
        let p: Prediction = serde_json::from_str(
            r#"{
                "id": "pred-2",
                "status": "succeeded",
                "output": ["https://cdn.example.com/out.png"],
                "error": null,
                "metrics": {"predict_time": 2.3}
            }"#,
        )
        .unwrap();
        assert_eq!(p.status, ProviderJobStatus::Succeeded);
        assert_eq!(p.output.as_array().unwrap().len(), 1);
    }

    #[test]
    fn request_includes_events_filter_only_with_webhook() {
        let with = CreatePredictionRequest::new(
            "owner/model".into(),
            serde_json::json!({"prompt": "a cat"}),
            Some("https://api.example.com/webhook".into()),
        );
        assert_eq!(with.webhook_events_filter, vec!["start", "completed"]);

        let without =
            CreatePredictionRequest::new("owner/model".into(), serde_json::json!({}), None);
        assert!(without.webhook_events_filter.is_empty());
    }
}
