//! HTTP surface: the webhook endpoint and health probe.

use std::sync::Arc;

use {
    axum::{
        Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode, Uri, header},
        response::{IntoResponse, Json, Response},
        routing::{get, post},
    },
    tracing::{info, warn},
    url::form_urlencoded,
};

use crate::{channel::WebhookChannel, turn::InboundTurn};

/// Signature header sent by the provider.
const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Empty TwiML: acknowledges receipt without sending inline content. The
/// real reply goes out later through the Messages API.
const EMPTY_TWIML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>";

#[derive(Clone)]
pub struct AppState {
    channel: Arc<dyn WebhookChannel>,
}

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(channel: Arc<dyn WebhookChannel>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/whatsapp", post(whatsapp_handler))
        .with_state(AppState { channel })
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Webhook entry point.
///
/// The provider enforces a response deadline far shorter than an agent
/// round-trip, so after authenticating we capture plain data, spawn a
/// detached task, and acknowledge immediately.
async fn whatsapp_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // The signature covers the raw form fields; decode before anything else
    // consumes the body.
    let params: Vec<(String, String)> = form_urlencoded::parse(&body).into_owned().collect();

    let url = public_url(&headers, &uri);
    let signature = header_str(&headers, SIGNATURE_HEADER);
    if !state.channel.validate(&url, &params, signature) {
        warn!(url, "invalid webhook signature");
        return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
    }

    let Some(turn) = InboundTurn::from_params(&params) else {
        return (StatusCode::BAD_REQUEST, "Missing 'From' in request form").into_response();
    };

    info!(sender = turn.sender, "webhook accepted, dispatching background task");
    let channel = Arc::clone(&state.channel);
    tokio::spawn(async move {
        channel.handle(turn).await;
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        EMPTY_TWIML,
    )
        .into_response()
}

/// Reconstruct the URL the provider signed. Behind a reverse proxy the
/// forwarded headers carry the public scheme and host; otherwise fall back
/// to the request's own host header and plain http.
fn public_url(headers: &HeaderMap, uri: &Uri) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_else(|| uri.scheme_str().unwrap_or("http"));
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    format!("{proto}://{host}{}", uri.path())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
