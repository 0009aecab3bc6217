use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::dispatcher::{Dispatcher, Reply};
use crate::platform::telegram::{extract_command, WebhookUpdate};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub bot_mention: String,
    pub secret_token: Option<String>,
}

pub fn router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Acknowledgement returned to Telegram. Always HTTP 200 so failed commands
/// are not redelivered.
pub fn ack_body(reply: Option<&Reply>) -> Value {
    match reply {
        Some(Reply::Balance { balance, .. }) => serde_json::to_value(balance).unwrap_or_else(|e| {
            warn!("Failed to serialise balance ack: {}", e);
            status_ok()
        }),
        Some(Reply::Failed(e)) => json!({ "error": e.user_message() }),
        _ => status_ok(),
    }
}

fn status_ok() -> Value {
    json!({ "status": 200 })
}

async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let span = info_span!(
        "webhook",
        request_id = %Uuid::new_v4(),
        chat_id = tracing::field::Empty
    );
    let reply = handle_update(&state, &headers, &body).instrument(span).await;
    Json(ack_body(reply.as_ref()))
}

async fn handle_update(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Option<Reply> {
    if let Some(expected) = &state.secret_token {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            warn!("Rejected update with missing or wrong secret token");
            return None;
        }
    }

    let update: WebhookUpdate = match serde_json::from_slice(body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Malformed update body: {}", e);
            return None;
        }
    };

    let Some(incoming) = extract_command(&update, &state.bot_mention) else {
        debug!("Update not addressed to the bot, ignoring");
        return None;
    };

    Span::current().record("chat_id", incoming.chat_id);
    info!(
        "Command from {}: {}",
        incoming.user_handle.as_deref().unwrap_or("<channel>"),
        incoming.text
    );

    let reply = state
        .dispatcher
        .dispatch(
            incoming.chat_id,
            &incoming.text,
            incoming.user_handle.as_deref(),
        )
        .await;
    Some(reply)
}
