//! The message-ingestion gateway.
//!
//! One webhook invocation flows through two phases. The synchronous phase
//! parses the form, checks the provider signature, and acknowledges with an
//! empty TwiML document inside the provider's response deadline. The
//! background phase — a detached task holding only plain captured data —
//! normalizes media into a single turn, derives the session thread, invokes
//! the agent runtime, and delivers the reply through the outbound API.

pub mod channel;
pub mod normalize;
pub mod server;
pub mod turn;

pub use {
    channel::{TwilioWhatsApp, WebhookChannel},
    normalize::{MediaNormalizer, TRANSCRIPTION_FAILED_SENTINEL},
    server::build_app,
    turn::{ImageReference, InboundTurn, MediaRef, NormalizedTurn},
};
