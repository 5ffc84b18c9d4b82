//! Webhook channel abstraction.
//!
//! A channel is the pair of capabilities a provider webhook needs: validate
//! that a request came from the provider, and handle one captured turn.
//! Adding a provider means adding an implementation, not a subclass.

use std::sync::Arc;

use {async_trait::async_trait, tracing::{error, info}};

use {
    courier_agent::{AgentRuntime, session_key},
    courier_twilio::{OutboundSender, SignatureValidator},
};

use crate::{normalize::MediaNormalizer, turn::InboundTurn};

/// Capability set of one webhook provider.
#[async_trait]
pub trait WebhookChannel: Send + Sync {
    /// Authenticate a request against the provider's signature scheme.
    fn validate(&self, url: &str, params: &[(String, String)], signature: &str) -> bool;

    /// Process one captured turn to completion: normalize, invoke the agent,
    /// deliver the reply. Runs detached from the webhook response; every
    /// failure is logged here and nothing propagates.
    async fn handle(&self, turn: InboundTurn);
}

/// Twilio WhatsApp channel.
pub struct TwilioWhatsApp {
    validator: SignatureValidator,
    normalizer: MediaNormalizer,
    agent: Arc<dyn AgentRuntime>,
    outbound: Arc<dyn OutboundSender>,
    /// Fallback "from" identity when the webhook carried no `To` address.
    default_sender: Option<String>,
}

impl TwilioWhatsApp {
    #[must_use]
    pub fn new(
        validator: SignatureValidator,
        normalizer: MediaNormalizer,
        agent: Arc<dyn AgentRuntime>,
        outbound: Arc<dyn OutboundSender>,
        default_sender: Option<String>,
    ) -> Self {
        Self {
            validator,
            normalizer,
            agent,
            outbound,
            default_sender,
        }
    }
}

#[async_trait]
impl WebhookChannel for TwilioWhatsApp {
    fn validate(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        self.validator.validate(url, params, signature)
    }

    async fn handle(&self, turn: InboundTurn) {
        let sender = turn.sender.clone();
        info!(sender, media = turn.media.len(), "processing turn");

        let normalized = self.normalizer.normalize(&turn.media, &turn.text).await;
        let session = session_key(&turn.sender);

        let reply = match self
            .agent
            .invoke(session, &normalized.text, &normalized.image_uris())
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                // Turn-scoped fatal: the sender gets no reply rather than a
                // malformed one.
                error!(sender, %session, error = %err, "agent invocation failed, dropping turn");
                return;
            },
        };

        // Symmetric reply: the webhook's recipient becomes the outbound
        // sender identity.
        let from = if turn.recipient.is_empty() {
            self.default_sender.clone()
        } else {
            Some(turn.recipient.clone())
        };
        let Some(from) = from else {
            error!(sender, "no outbound sender number configured, dropping reply");
            return;
        };

        // At-most-once: a delivery failure is logged, never retried.
        match self.outbound.send_text(&sender, &from, &reply).await {
            Ok(sid) => info!(sender, sid, "reply delivered"),
            Err(err) => error!(sender, from, error = %err, "reply delivery failed"),
        }
    }
}
