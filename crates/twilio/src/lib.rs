//! Twilio integration: webhook signature validation, authenticated media
//! download, and the outbound Messages API.

pub mod media;
pub mod outbound;
pub mod signature;

pub use {
    media::{MediaClient, MediaSource},
    outbound::{Messenger, OutboundSender, ensure_whatsapp_prefix},
    signature::SignatureValidator,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Account SID or auth token is absent. Constructors reject this so the
    /// process fails at startup rather than on the first request.
    #[error("Twilio credentials are not configured")]
    CredentialsMissing,

    /// Media download failed in transport (connect, timeout, body read).
    #[error("failed to download media from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Media host answered with a non-success status.
    #[error("media download from {url} returned {status}")]
    DownloadStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Outbound send failed in transport.
    #[error("failed to send message: {source}")]
    Send {
        #[source]
        source: reqwest::Error,
    },

    /// Messages API answered with a non-success status.
    #[error("message send returned {status}: {body}")]
    SendStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}
