//! Media classification and object naming for archived outputs.
//!
//! Provider URLs are transient; archived copies are keyed by owner and a
//! random collision-free name. Classification decides the destination
//! bucket (image vs. video) from the response content type and, failing
//! that, the URL's file extension.

use rand::Rng;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of the random object name (alphanumeric characters).
pub const OBJECT_NAME_LENGTH: usize = 16;

/// Path prefix used when a generation has no owning profile.
pub const ANONYMOUS_OWNER_SEGMENT: &str = "anonymous";

/// File extensions treated as video when no usable content type exists.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "m4v"];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Kind of media being archived; selects the destination bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify a downloaded output as image or video.
///
/// The content-type header wins when present; otherwise the URL's file
/// extension is checked against known video extensions. Anything else is
/// an image (the common case for generation output).
pub fn classify(content_type: Option<&str>, url: &str) -> MediaKind {
    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        if ct.starts_with("video/") {
            return MediaKind::Video;
        }
        if ct.starts_with("image/") {
            return MediaKind::Image;
        }
    }
    if VIDEO_EXTENSIONS.contains(&url_extension(url).as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Normalize a file extension from the content type.
///
/// Unrecognized video types default to `mp4`, unrecognized image types to
/// `webp`.
pub fn extension_for(content_type: Option<&str>, kind: MediaKind) -> &'static str {
    let ct = content_type.map(str::to_ascii_lowercase).unwrap_or_default();
    match (kind, ct.as_str()) {
        (MediaKind::Video, "video/mp4") => "mp4",
        (MediaKind::Video, "video/webm") => "webm",
        (MediaKind::Video, "video/quicktime") => "mov",
        (MediaKind::Video, _) => "mp4",
        (MediaKind::Image, "image/png") => "png",
        (MediaKind::Image, "image/jpeg" | "image/jpg") => "jpg",
        (MediaKind::Image, "image/gif") => "gif",
        (MediaKind::Image, "image/webp") => "webp",
        (MediaKind::Image, _) => "webp",
    }
}

/// Extract the lowercase file extension from a URL path, ignoring query
/// string and fragment.
fn url_extension(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Object naming
// ---------------------------------------------------------------------------

/// Generate a random object file name: 16 alphanumeric chars plus extension.
pub fn object_name(extension: &str) -> String {
    let name: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(OBJECT_NAME_LENGTH)
        .map(char::from)
        .collect();
    format!("{name}.{extension}")
}

/// Build the full object key for an archived output, namespaced by owner.
pub fn object_key(owner: Option<crate::types::DbId>, extension: &str) -> String {
    let segment = owner
        .map(|id| id.to_string())
        .unwrap_or_else(|| ANONYMOUS_OWNER_SEGMENT.to_string());
    format!("generations/{segment}/{}", object_name(extension))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
