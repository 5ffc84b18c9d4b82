//! Content-type classification.
//!
//! Webhook providers report a MIME type per attachment; everything downstream
//! (transcription, embedding, drop decisions) keys off the category derived
//! here. Classification is a total function: any input maps to a category and
//! an extension.

/// General category of a media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Classify a raw content type (parameters stripped, case-insensitive).
    #[must_use]
    pub fn classify(content_type: &str) -> Self {
        let cleaned = clean_content_type(content_type);
        // WhatsApp voice notes arrive as `application/ogg` on some routes.
        if cleaned.starts_with("audio/") || cleaned == "application/ogg" {
            Self::Audio
        } else if cleaned.starts_with("image/") {
            Self::Image
        } else if cleaned.starts_with("video/") {
            Self::Video
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub fn is_audio(self) -> bool {
        self == Self::Audio
    }

    #[must_use]
    pub fn is_image(self) -> bool {
        self == Self::Image
    }
}

/// Strip parameters (`; codecs=opus`) and normalize case.
#[must_use]
pub fn clean_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Map a content type to a file extension.
///
/// The transcription backend infers the decoding format from the filename
/// extension, so the mapping favors containers the backend accepts over
/// strictly correct ones (AMR and 3GPP land on `.m4a`, AIFF on `.wav`).
/// Unknown types map to `.bin`.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match clean_content_type(content_type).as_str() {
        // Audio
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/mp4" => ".mp4",
        "audio/m4a" | "audio/x-m4a" | "audio/aac" | "audio/amr" | "audio/3gpp" => ".m4a",
        "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/aiff" | "audio/x-aiff" => ".wav",
        "audio/flac" => ".flac",
        "audio/ogg" | "application/ogg" | "audio/opus" | "audio/x-opus" | "audio/vorbis"
        | "audio/x-vorbis" => ".ogg",
        "audio/webm" => ".webm",
        // Image
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/svg+xml" => ".svg",
        // Video
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/ogg" => ".ogv",
        "video/avi" => ".avi",
        "video/mov" => ".mov",
        // Documents
        "application/pdf" => ".pdf",
        "text/plain" => ".txt",
        "application/json" => ".json",
        "application/xml" => ".xml",
        "text/html" => ".html",
        _ => ".bin",
    }
}

/// Ensure `filename` carries an extension consistent with `content_type`.
///
/// Falls back to `default_stem` when the name is empty. An existing extension
/// that disagrees with the content type is replaced, because the transcription
/// backend trusts the extension over the bytes.
#[must_use]
pub fn ensure_filename(filename: &str, content_type: &str, default_stem: &str) -> String {
    let ext = extension_for(content_type);
    let name = filename.trim();
    let stem = if name.is_empty() { default_stem } else { name };

    if ext == ".bin" {
        // Unknown type: keep whatever extension the name already has.
        return if stem.contains('.') {
            stem.to_string()
        } else {
            format!("{stem}.bin")
        };
    }

    match stem.rsplit_once('.') {
        Some((base, old_ext)) if format!(".{}", old_ext.to_ascii_lowercase()) == ext => {
            format!("{base}.{old_ext}")
        },
        Some((base, _)) => format!("{base}{ext}"),
        None => format!("{stem}{ext}"),
    }
}
