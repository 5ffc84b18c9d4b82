//! Agent-runtime client: stable session derivation and the streaming runs
//! RPC that carries a normalized turn to the remote graph.

mod client;
mod session;
mod sse;

pub use {
    client::{AgentClient, AgentError, AgentRuntime},
    session::session_key,
};
