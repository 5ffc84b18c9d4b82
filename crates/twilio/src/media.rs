//! Authenticated download of provider-hosted media.

use std::time::Duration;

use {
    async_trait::async_trait,
    bytes::Bytes,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{Error, Result};

/// Download timeout. Voice notes are small; anything slower than this is a
/// stuck connection.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can retrieve attachment bytes by URL.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch `url`, returning the body and its `Content-Type`.
    async fn fetch(&self, url: &str) -> Result<(Bytes, String)>;
}

/// Fetches media from Twilio's media-hosting endpoint with basic auth.
pub struct MediaClient {
    client: Client,
    account_sid: String,
    auth_token: Secret<String>,
}

impl std::fmt::Debug for MediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

impl MediaClient {
    /// Create a new media client. Fails when credentials are blank so the
    /// process rejects a misconfigured environment at startup.
    pub fn new(account_sid: impl Into<String>, auth_token: Secret<String>) -> Result<Self> {
        let account_sid = account_sid.into();
        if account_sid.trim().is_empty() || auth_token.expose_secret().trim().is_empty() {
            return Err(Error::CredentialsMissing);
        }
        Ok(Self {
            client: Client::new(),
            account_sid,
            auth_token,
        })
    }
}

#[async_trait]
impl MediaSource for MediaClient {
    async fn fetch(&self, url: &str) -> Result<(Bytes, String)> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|source| Error::Download {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownloadStatus {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response.bytes().await.map_err(|source| Error::Download {
            url: url.to_string(),
            source,
        })?;

        debug!(url, content_type, size = bytes.len(), "downloaded media");
        Ok((bytes, content_type))
    }
}
