//! Media normalization: raw attachment list → one structured turn.

use std::sync::Arc;

use tracing::{debug, error, info};

use {
    courier_media::{ImageMimePolicy, MediaKind, embed_image},
    courier_twilio::MediaSource,
    courier_voice::{SttProvider, TranscribeRequest},
};

use crate::turn::{ImageReference, MediaRef, NormalizedTurn};

/// Substituted when a voice note cannot be fetched or transcribed. The
/// failure is additionally logged with the attachment URL, since the agent
/// cannot tell this string apart from a real transcript.
pub const TRANSCRIPTION_FAILED_SENTINEL: &str = "[Audio transcription failed]";

/// Orchestrates fetch, classification, transcription, and embedding.
pub struct MediaNormalizer {
    media: Arc<dyn MediaSource>,
    stt: Arc<dyn SttProvider>,
    image_mime_policy: ImageMimePolicy,
}

impl MediaNormalizer {
    #[must_use]
    pub fn new(
        media: Arc<dyn MediaSource>,
        stt: Arc<dyn SttProvider>,
        image_mime_policy: ImageMimePolicy,
    ) -> Self {
        Self {
            media,
            stt,
            image_mime_policy,
        }
    }

    /// Normalize the attachments of one turn.
    ///
    /// Audio items are processed in provider index order so the combined
    /// transcript is deterministic. One bad attachment degrades that
    /// attachment only: failed audio becomes the sentinel transcript, a
    /// failed image is omitted.
    pub async fn normalize(&self, media: &[MediaRef], text: &str) -> NormalizedTurn {
        let mut transcripts = Vec::new();
        let mut images = Vec::new();

        for item in media {
            match MediaKind::classify(&item.content_type) {
                MediaKind::Audio => transcripts.push(self.transcribe(item).await),
                MediaKind::Image => {
                    if let Some(image) = self.embed(item).await {
                        images.push(image);
                    }
                },
                kind => {
                    debug!(url = %item.url, content_type = %item.content_type, ?kind, "dropping unsupported attachment");
                },
            }
        }

        let text = combine_text(&transcripts, text);
        NormalizedTurn { text, images }
    }

    async fn transcribe(&self, item: &MediaRef) -> String {
        let (audio, fetched_type) = match self.media.fetch(&item.url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(url = %item.url, error = %err, "audio fetch failed, substituting sentinel");
                return TRANSCRIPTION_FAILED_SENTINEL.to_string();
            },
        };

        // Prefer the provider-declared type; the media host occasionally
        // answers with a bare octet-stream.
        let content_type = if item.content_type.trim().is_empty() {
            fetched_type
        } else {
            item.content_type.clone()
        };

        let request = TranscribeRequest {
            audio,
            filename: filename_from_url(&item.url, "audio.ogg"),
            content_type,
        };
        match self.stt.transcribe(request).await {
            Ok(transcript) => {
                info!(url = %item.url, chars = transcript.len(), "voice note transcribed");
                transcript
            },
            Err(err) => {
                error!(url = %item.url, error = %err, "transcription failed, substituting sentinel");
                TRANSCRIPTION_FAILED_SENTINEL.to_string()
            },
        }
    }

    async fn embed(&self, item: &MediaRef) -> Option<ImageReference> {
        let (bytes, fetched_type) = match self.media.fetch(&item.url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(url = %item.url, error = %err, "image fetch failed, omitting attachment");
                return None;
            },
        };

        let content_type = if item.content_type.trim().is_empty() {
            fetched_type
        } else {
            item.content_type.clone()
        };

        embed_image(&bytes, &content_type, self.image_mime_policy)
            .map(|embeddable_uri| ImageReference { embeddable_uri })
    }
}

/// Join transcripts with blank lines; when the message also carried literal
/// text, append it labeled so the agent sees both signals.
fn combine_text(transcripts: &[String], text: &str) -> String {
    if transcripts.is_empty() {
        return text.to_string();
    }
    let mut combined = transcripts.join("\n\n");
    if !text.is_empty() {
        combined.push_str(&format!("\n\nText message: {text}"));
    }
    combined
}

/// Last path segment of the media URL, used as the transcription filename
/// hint.
fn filename_from_url(url: &str, default: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(default)
        .to_string()
}
