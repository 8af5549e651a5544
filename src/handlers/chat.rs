//! # Text Chat Handler
//!
//! `POST /chat` answers a text message with a canned reply. When the request
//! names a chat that currently has a live websocket connection, the same
//! reply is pushed down that connection as an `ai_response` frame.

use crate::error::AppError;
use crate::state::AppState;
use crate::websocket::{Push, ServerMessage};
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub timestamp: String,
    pub status: String,
}

/// Reply to a text chat message.
///
/// ## Endpoint: `POST /chat`
///
/// ## Request:
/// ```json
/// { "message": "帮助", "user_id": "u-1", "chat_id": "chat-42" }
/// ```
///
/// ## Errors:
/// - **400**: message is empty or only whitespace
pub async fn chat(
    state: web::Data<AppState>,
    body: web::Json<ChatMessage>,
) -> ActixResult<HttpResponse, AppError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::ValidationError("Message must not be empty".to_string()));
    }

    let reply = state.replies.reply(message);
    info!(
        user_id = body.user_id.as_deref().unwrap_or("anonymous"),
        "Chat message received ({} chars)",
        message.chars().count()
    );

    if let Some(chat_id) = body.chat_id.as_deref() {
        if let Some(session) = state.registry.get(chat_id) {
            if let Some(frame) = ServerMessage::ai_response(reply.clone()).to_json() {
                debug!(chat_id = %chat_id, "Mirroring reply to live session");
                session.do_send(Push(frame));
            }
        }
    }

    Ok(HttpResponse::Ok().json(ChatResponse {
        reply,
        timestamp: chrono::Utc::now().to_rfc3339(),
        status: "success".to_string(),
    }))
}
