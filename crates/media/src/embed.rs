//! Inline embedding of fetched media as data URIs.
//!
//! Images are handed to the agent runtime as self-contained `data:` URIs so
//! the runtime never needs provider credentials to view them.

use {
    base64::{Engine as _, engine::general_purpose::STANDARD},
    tracing::warn,
};

use crate::kind::{MediaKind, clean_content_type};

/// MIME used when a mislabeled attachment is coerced to an image type.
const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// What to do with an attachment whose content type is not `image/*`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageMimePolicy {
    /// Embed anyway under `image/jpeg`. Matches upstream provider behavior,
    /// where voice-note routes occasionally mislabel images.
    #[default]
    CoerceToJpeg,
    /// Omit the attachment.
    Drop,
}

impl ImageMimePolicy {
    /// Parse from config (`coerce` | `drop`); unknown values fall back to the
    /// default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" => Self::Drop,
            _ => Self::CoerceToJpeg,
        }
    }
}

/// Encode bytes as `data:{mime};base64,{payload}`.
#[must_use]
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Build an embeddable data URI for an image attachment.
///
/// Returns `None` when the declared type is not an image and the policy says
/// to drop it.
#[must_use]
pub fn embed_image(bytes: &[u8], content_type: &str, policy: ImageMimePolicy) -> Option<String> {
    let cleaned = clean_content_type(content_type);
    let mime = if MediaKind::classify(&cleaned).is_image() {
        cleaned
    } else {
        match policy {
            ImageMimePolicy::CoerceToJpeg => {
                warn!(content_type = %cleaned, "coercing non-image MIME to {FALLBACK_IMAGE_MIME}");
                FALLBACK_IMAGE_MIME.to_string()
            },
            ImageMimePolicy::Drop => {
                warn!(content_type = %cleaned, "dropping attachment with non-image MIME");
                return None;
            },
        }
    };
    Some(to_data_uri(bytes, &mime))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_format() {
        let uri = to_data_uri(b"abc", "image/png");
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }

    #[test]
    fn image_mime_passes_through() {
        let uri = embed_image(b"x", "image/png", ImageMimePolicy::CoerceToJpeg).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn mime_parameters_stripped_before_embedding() {
        let uri = embed_image(b"x", "image/jpeg; q=0.9", ImageMimePolicy::Drop).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn non_image_coerced_to_jpeg() {
        let uri = embed_image(b"x", "application/octet-stream", ImageMimePolicy::CoerceToJpeg)
            .unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn non_image_dropped_under_drop_policy() {
        assert!(embed_image(b"x", "application/octet-stream", ImageMimePolicy::Drop).is_none());
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(ImageMimePolicy::parse("drop"), ImageMimePolicy::Drop);
        assert_eq!(ImageMimePolicy::parse("Coerce"), ImageMimePolicy::CoerceToJpeg);
        assert_eq!(ImageMimePolicy::parse(""), ImageMimePolicy::CoerceToJpeg);
    }
}
