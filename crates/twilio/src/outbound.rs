//! Outbound message delivery through the Twilio Messages API.

use {
    async_trait::async_trait,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::info,
};

use crate::{Error, Result};

/// Production Twilio API base.
const API_BASE: &str = "https://api.twilio.com";

/// WhatsApp addresses on Twilio carry this prefix.
const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Something that can push a text reply back to a sender.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    /// Send `body` to `to`, appearing as `from`. Returns the provider message
    /// id.
    async fn send_text(&self, to: &str, from: &str, body: &str) -> Result<String>;
}

/// Normalize a bare number into the channel address format.
#[must_use]
pub fn ensure_whatsapp_prefix(address: &str) -> String {
    if address.starts_with(WHATSAPP_PREFIX) {
        address.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{address}")
    }
}

/// Messages API client.
pub struct Messenger {
    client: Client,
    account_sid: String,
    auth_token: Secret<String>,
    base_url: String,
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

impl Messenger {
    /// Create a new Messages API client; blank credentials are rejected.
    pub fn new(account_sid: impl Into<String>, auth_token: Secret<String>) -> Result<Self> {
        let account_sid = account_sid.into();
        if account_sid.trim().is_empty() || auth_token.expose_secret().trim().is_empty() {
            return Err(Error::CredentialsMissing);
        }
        Ok(Self {
            client: Client::new(),
            account_sid,
            auth_token,
            base_url: API_BASE.into(),
        })
    }

    /// Override the API base URL (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl OutboundSender for Messenger {
    async fn send_text(&self, to: &str, from: &str, body: &str) -> Result<String> {
        let to = ensure_whatsapp_prefix(to);
        let from = ensure_whatsapp_prefix(from);

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|source| Error::Send { source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SendStatus { status, body });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|source| Error::Send { source })?;

        info!(to, sid = %resource.sid, "message sent");
        Ok(resource.sid)
    }
}
