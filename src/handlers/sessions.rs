//! Server-side session control.

use crate::state::AppState;
use crate::websocket::Evict;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

/// Drop the registry entry for a chat and close its connection.
///
/// ## Endpoint: `DELETE /api/v1/sessions/{chat_id}`
///
/// Disconnecting a chat with no live connection is not an error; the
/// response simply reports `"disconnected": false`.
pub async fn disconnect_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let chat_id = path.into_inner();
    let removed = state.registry.disconnect(&chat_id);

    if let Some(session) = &removed {
        info!(chat_id = %chat_id, "Session disconnected by request");
        session.do_send(Evict);
    }

    HttpResponse::Ok().json(json!({
        "chat_id": chat_id,
        "disconnected": removed.is_some()
    }))
}
