//! Speech-to-text for inbound voice notes.

mod whisper;

pub use whisper::WhisperStt;

use {anyhow::Result, async_trait::async_trait, bytes::Bytes};

/// Smallest byte count we accept as plausible audio. Anything below this is
/// rejected locally instead of being submitted to the backend.
pub const MIN_PLAUSIBLE_AUDIO_BYTES: usize = 100;

/// Request to transcribe one voice note.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    /// Raw audio data.
    pub audio: Bytes,
    /// Filename hint; the backend infers the decode format from its
    /// extension.
    pub filename: String,
    /// Declared MIME type of the audio.
    pub content_type: String,
}

/// A speech-to-text backend.
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Short stable identifier (for logs).
    fn id(&self) -> &'static str;

    /// Whether the provider has the credentials it needs.
    fn is_configured(&self) -> bool;

    /// Transcribe audio to plain text.
    async fn transcribe(&self, request: TranscribeRequest) -> Result<String>;
}
