//! Streaming client for the remote agent runtime.

use {
    async_trait::async_trait,
    futures::StreamExt,
    reqwest::Client,
    serde_json::{Value, json},
    tracing::{debug, warn},
    uuid::Uuid,
};

use crate::sse::SseParser;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Transport failure opening or consuming the stream.
    #[error("agent runtime transport failure: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// Runtime answered with a non-success status.
    #[error("agent runtime returned {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Final checkpoint was not valid JSON.
    #[error("failed to decode agent checkpoint: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// Stream ended without a usable reply message.
    #[error("agent run produced no reply")]
    EmptyReply,
}

/// Seam between the gateway and the remote runtime; the production
/// implementation is [`AgentClient`].
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Submit a turn on the given session and wait for the reply text.
    async fn invoke(&self, session: Uuid, text: &str, image_refs: &[String]) -> Result<String>;
}

/// HTTP client for a LangGraph-style runs API.
#[derive(Debug, Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
    assistant_id: String,
    run_config: Value,
}

impl AgentClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, assistant_id: impl Into<String>, run_config: Value) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            assistant_id: assistant_id.into(),
            run_config,
        }
    }

    /// Run-creation payload for one turn.
    ///
    /// `multitask_strategy: interrupt` serializes concurrent turns from the
    /// same sender at the runtime — a new message on a busy session restarts
    /// the run instead of queueing behind it.
    fn build_payload(&self, text: &str, image_refs: &[String]) -> Value {
        json!({
            "assistant_id": self.assistant_id,
            "input": {
                "messages": [{
                    "role": "user",
                    "content": content_blocks(text, image_refs),
                }],
            },
            "config": self.run_config,
            "metadata": { "event": "api_call" },
            "multitask_strategy": "interrupt",
            "if_not_exists": "create",
            "stream_mode": "values",
        })
    }
}

/// Ordered content blocks: at most one text block, then one block per image.
fn content_blocks(text: &str, image_refs: &[String]) -> Value {
    let mut blocks = Vec::new();
    if !text.is_empty() {
        blocks.push(json!({ "type": "text", "text": text }));
    }
    for uri in image_refs {
        blocks.push(json!({ "type": "image_url", "image_url": { "url": uri } }));
    }
    Value::Array(blocks)
}

/// Pull the reply text out of a checkpoint: the last message's content,
/// either a bare string or the concatenated text blocks of a block array.
fn extract_reply(checkpoint: &Value) -> Option<String> {
    let content = checkpoint.get("messages")?.as_array()?.last()?.get("content")?;
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| {
                if block.get("type").and_then(Value::as_str) == Some("text") {
                    block.get("text").and_then(Value::as_str)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

#[async_trait]
impl AgentRuntime for AgentClient {
    async fn invoke(&self, session: Uuid, text: &str, image_refs: &[String]) -> Result<String> {
        let url = format!("{}/threads/{session}/runs/stream", self.base_url);
        debug!(%session, url, "starting agent run");

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(&self.build_payload(text, image_refs))
            .send()
            .await
            .map_err(|source| AgentError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Http { status, body });
        }

        // Each `values` checkpoint carries the full conversation state, so
        // earlier frames are superseded rather than accumulated.
        let mut parser = SseParser::new();
        let mut last_checkpoint: Option<String> = None;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| AgentError::Transport { source })?;
            for event in parser.push(&chunk) {
                match event.event.as_deref() {
                    Some("values") => last_checkpoint = Some(event.data),
                    Some("error") => warn!(%session, data = %event.data, "agent stream error event"),
                    _ => {},
                }
            }
        }

        let data = last_checkpoint.ok_or(AgentError::EmptyReply)?;
        let checkpoint: Value =
            serde_json::from_str(&data).map_err(|source| AgentError::Decode { source })?;
        extract_reply(&checkpoint).ok_or(AgentError::EmptyReply)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{method, path},
        },
    };

    fn client(base: &str) -> AgentClient {
        AgentClient::new(base, "agent", json!({"recursion_limit": 10}))
    }

    fn values_frame(reply: &str) -> String {
        format!(
            "event: values\ndata: {}\n\n",
            json!({ "messages": [{ "role": "assistant", "content": reply }] })
        )
    }

    #[test]
    fn payload_carries_run_contract() {
        let payload = client("http://x").build_payload("hi", &[]);
        assert_eq!(payload["assistant_id"], "agent");
        assert_eq!(payload["multitask_strategy"], "interrupt");
        assert_eq!(payload["if_not_exists"], "create");
        assert_eq!(payload["stream_mode"], "values");
        assert_eq!(payload["config"]["recursion_limit"], 10);
        assert_eq!(payload["metadata"]["event"], "api_call");
    }

    #[test]
    fn content_blocks_ordered_text_first() {
        let blocks = content_blocks("hello", &["data:image/png;base64,AA".into()]);
        let blocks = blocks.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(blocks[1]["type"], "image_url");
        assert_eq!(blocks[1]["image_url"]["url"], "data:image/png;base64,AA");
    }

    #[test]
    fn empty_text_omits_text_block() {
        let blocks = content_blocks("", &["data:image/png;base64,AA".into()]);
        assert_eq!(blocks.as_array().unwrap().len(), 1);
    }

    #[test]
    fn reply_from_string_content() {
        let checkpoint = json!({ "messages": [
            { "role": "user", "content": "q" },
            { "role": "assistant", "content": "a" },
        ]});
        assert_eq!(extract_reply(&checkpoint).unwrap(), "a");
    }

    #[test]
    fn reply_from_block_content() {
        let checkpoint = json!({ "messages": [{
            "role": "assistant",
            "content": [
                { "type": "text", "text": "part one" },
                { "type": "tool_use", "id": "t1" },
                { "type": "text", "text": "part two" },
            ],
        }]});
        assert_eq!(extract_reply(&checkpoint).unwrap(), "part one\npart two");
    }

    #[test]
    fn empty_reply_is_none() {
        assert!(extract_reply(&json!({ "messages": [] })).is_none());
        assert!(extract_reply(&json!({ "messages": [{ "content": "" }] })).is_none());
        assert!(extract_reply(&json!({})).is_none());
    }

    #[tokio::test]
    async fn invoke_keeps_only_last_checkpoint() {
        let server = MockServer::start().await;
        let body = format!(
            "{}{}{}",
            values_frame("first"),
            values_frame("second"),
            values_frame("third")
        );
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let session = crate::session_key("whatsapp:+1555");
        let reply = client(&server.uri()).invoke(session, "q", &[]).await.unwrap();
        assert_eq!(reply, "third");
    }

    #[tokio::test]
    async fn invoke_posts_to_session_thread() {
        let server = MockServer::start().await;
        let session = crate::session_key("whatsapp:+1555");
        Mock::given(method("POST"))
            .and(path(format!("/threads/{session}/runs/stream")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(values_frame("ok")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server.uri()).invoke(session, "q", &[]).await.unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn http_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let session = crate::session_key("x");
        let err = client(&server.uri()).invoke(session, "q", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Http { status, .. } if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn stream_without_values_is_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("event: metadata\ndata: {}\n\n"),
            )
            .mount(&server)
            .await;

        let session = crate::session_key("x");
        let err = client(&server.uri()).invoke(session, "q", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyReply));
    }
}
