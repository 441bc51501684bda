//! Provider output normalization.
//!
//! Completion payloads arrive in several shapes depending on the model:
//! a bare URL string, an array of URLs, an object carrying a `url` or
//! `href` field, or arrays of such objects. [`normalize_outputs`] flattens
//! all of them into plain HTTP(S) URL strings; unrecognized shapes are
//! logged and dropped rather than silently swallowed.

use serde_json::Value;

/// Keys checked, in order, when the output entry is a JSON object.
const URL_KEYS: &[&str] = &["url", "href", "output"];

/// Normalize a provider output payload into a list of HTTP(S) URLs.
///
/// Returns an empty vector when the payload contains no usable URL, which
/// the finalize path treats as a billing-safe failure.
pub fn normalize_outputs(output: &Value) -> Vec<String> {
    let mut urls = Vec::new();
    collect(output, &mut urls);
    urls
}

fn collect(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => push_if_url(s, urls),
        Value::Array(items) => {
            for item in items {
                collect(item, urls);
            }
        }
        Value::Object(map) => {
            if let Some(url) = URL_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
            {
                push_if_url(url, urls);
            } else if let Some(nested) = URL_KEYS.iter().find_map(|key| map.get(*key)) {
                // `output` may itself hold an array or object of URLs.
                collect(nested, urls);
            } else {
                tracing::warn!(
                    keys = ?map.keys().collect::<Vec<_>>(),
                    "Unrecognized provider output object shape, dropping entry"
                );
            }
        }
        other => {
            tracing::warn!(value = %other, "Unrecognized provider output value, dropping entry");
        }
    }
}

/// Keep only entries that look like real HTTP(S) URLs.
fn push_if_url(candidate: &str, urls: &mut Vec<String>) {
    let trimmed = candidate.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        urls.push(trimmed.to_string());
    } else {
        tracing::warn!(candidate = %trimmed, "Discarding non-HTTP output entry");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
