//! OpenAI Whisper transcription backend.

use {
    anyhow::{Context, Result, anyhow, bail},
    async_trait::async_trait,
    courier_media::ensure_filename,
    reqwest::{
        Client,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{MIN_PLAUSIBLE_AUDIO_BYTES, SttProvider, TranscribeRequest};

/// OpenAI API base URL.
const API_BASE: &str = "https://api.openai.com/v1";

/// Default Whisper model.
const DEFAULT_MODEL: &str = "whisper-1";

/// OpenAI Whisper speech-to-text provider.
#[derive(Clone)]
pub struct WhisperStt {
    client: Client,
    api_key: Option<Secret<String>>,
    model: String,
    language: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for WhisperStt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperStt")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("language", &self.language)
            .finish()
    }
}

impl Default for WhisperStt {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WhisperStt {
    /// Create a new Whisper provider.
    #[must_use]
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            language: None,
            base_url: API_BASE.into(),
        }
    }

    /// Create with custom model and language hint.
    #[must_use]
    pub fn with_options(
        api_key: Option<Secret<String>>,
        model: Option<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
            language,
            base_url: API_BASE.into(),
        }
    }

    /// Override the API base URL (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get_api_key(&self) -> Result<&Secret<String>> {
        self.api_key
            .as_ref()
            .ok_or_else(|| anyhow!("OpenAI API key not configured for Whisper"))
    }
}

#[async_trait]
impl SttProvider for WhisperStt {
    fn id(&self) -> &'static str {
        "whisper"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn transcribe(&self, request: TranscribeRequest) -> Result<String> {
        let api_key = self.get_api_key()?;

        if request.audio.is_empty() {
            bail!("audio payload is empty");
        }
        if request.audio.len() < MIN_PLAUSIBLE_AUDIO_BYTES {
            bail!(
                "audio payload too small ({} bytes), not submitting for transcription",
                request.audio.len()
            );
        }

        // The backend infers the decoding format from the filename extension,
        // so the extension must agree with the declared content type.
        let filename = ensure_filename(&request.filename, &request.content_type, "audio");

        debug!(
            filename,
            content_type = %request.content_type,
            size = request.audio.len(),
            "transcribing voice note"
        );

        // A garbage content type must not block the upload; the filename
        // extension alone is enough for the backend.
        let mime = courier_media::clean_content_type(&request.content_type);
        let file_part = match Part::bytes(request.audio.to_vec())
            .file_name(filename.clone())
            .mime_str(&mime)
        {
            Ok(part) => part,
            Err(_) => Part::bytes(request.audio.to_vec()).file_name(filename.clone()),
        };

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        if let Some(language) = self.language.clone() {
            form = form.text("language", language);
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .multipart(form)
            .send()
            .await
            .context("failed to send Whisper transcription request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Whisper transcription failed: {status} - {body}"));
        }

        // response_format=text returns the transcript as a plain string.
        let transcript = response
            .text()
            .await
            .context("failed to read Whisper response body")?;
        Ok(transcript.trim().to_string())
    }
}
