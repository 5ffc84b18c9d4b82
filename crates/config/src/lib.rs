//! Process-wide configuration.
//!
//! All configuration comes from the environment, is validated once at
//! startup, and is immutable afterwards. Request-handling code receives the
//! resulting [`Config`] by reference; nothing re-reads the environment per
//! request. Missing mandatory credentials fail here, at construction, not on
//! the first webhook.

use {courier_media::ImageMimePolicy, secrecy::Secret};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mandatory environment variable is absent or empty.
    #[error("missing required environment variable: {name}")]
    MissingVar { name: &'static str },

    /// The `CONFIG` run-config JSON failed to parse.
    #[error("CONFIG is not valid JSON: {source}")]
    InvalidRunConfig {
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the agent runtime.
    pub agent_url: String,
    /// Assistant to run on the remote graph.
    pub assistant_id: String,
    /// Opaque run configuration forwarded to every agent run.
    pub run_config: serde_json::Value,
    /// Twilio account SID (doubles as the media-fetch basic-auth user).
    pub twilio_account_sid: String,
    /// Twilio auth token: signs webhooks, authenticates API calls.
    pub twilio_auth_token: Secret<String>,
    /// Default outbound WhatsApp sender number, if configured.
    pub twilio_whatsapp_number: Option<String>,
    /// OpenAI key for transcription; absent means voice notes degrade to the
    /// failure sentinel.
    pub openai_api_key: Option<Secret<String>>,
    /// Policy for attachments declared with a non-image MIME type.
    pub image_mime_policy: ImageMimePolicy,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Lets tests supply variables
    /// without touching the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String> {
            match get(name) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(Error::MissingVar { name }),
            }
        };
        let optional = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let run_config = match optional("CONFIG") {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| Error::InvalidRunConfig { source })?
            },
            None => serde_json::json!({}),
        };

        Ok(Self {
            agent_url: required("LANGGRAPH_URL")?,
            assistant_id: optional("LANGGRAPH_ASSISTANT_ID").unwrap_or_else(|| "agent".into()),
            run_config,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: Secret::new(required("TWILIO_AUTH_TOKEN")?),
            twilio_whatsapp_number: optional("TWILIO_WHATSAPP_NUMBER"),
            openai_api_key: optional("OPENAI_API_KEY").map(Secret::new),
            image_mime_policy: optional("COURIER_IMAGE_MIME_POLICY")
                .map(|v| ImageMimePolicy::parse(&v))
                .unwrap_or_default(),
        })
    }
}
