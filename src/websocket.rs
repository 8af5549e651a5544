//! # WebSocket Chat Handler
//!
//! Real-time chat channel at `/ws/chat/{chat_id}`. Each connection is an actix
//! actor registered in the [`ConnectionRegistry`] under its chat id for as long
//! as it is the live connection for that id.
//!
//! ## WebSocket Protocol:
//! 1. **Connection**: Client connects to `/ws/chat/{chat_id}`
//! 2. **Text frames**: JSON `{"content": "..."}`, answered with an `ai_response`
//! 3. **Binary frames**: Raw audio, answered with a mock `transcription`
//! 4. **Heartbeat**: Server pings periodically and drops silent clients
//!
//! ## Message Format:
//! - **Client → Server**: JSON text or binary audio
//! - **Server → Client**: JSON messages tagged by `type`
//!
//! ## Reconnects:
//! Connecting again with a chat id that is already live replaces the
//! registration. The older connection keeps running but is no longer
//! reachable through the registry, and when it closes it leaves the newer
//! registration untouched.

use crate::registry::ConnectionRegistry;
use crate::state::AppState;

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Registry of live chat connections keyed by chat id.
pub type ChatRegistry = ConnectionRegistry<Addr<ChatWebSocket>>;

/// Text frame sent by the client.
#[derive(Debug, Deserialize)]
struct ClientMessage {
    #[serde(default)]
    content: String,
}

/// Messages sent from server to client.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Assistant reply to a text message
    #[serde(rename = "ai_response")]
    AiResponse {
        content: String,
        timestamp: String,
        status: String,
    },

    /// Mock transcript of a binary audio frame
    #[serde(rename = "transcription")]
    Transcription {
        content: String,
        status: String,
        timestamp: String,
    },

    /// Client sent something we could not handle; the connection stays open
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn ai_response(content: String) -> Self {
        ServerMessage::AiResponse {
            content,
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: "completed".to_string(),
        }
    }

    pub fn transcription(content: String) -> Self {
        ServerMessage::Transcription {
            content,
            status: "completed".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(err) => {
                error!("Failed to serialize websocket message: {}", err);
                None
            }
        }
    }
}

/// Deliver a pre-serialized text frame to the session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Push(pub String);

/// Close the session from the server side.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Evict;

/// WebSocket actor for one chat connection.
pub struct ChatWebSocket {
    chat_id: String,
    state: AppState,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    last_heartbeat: Instant,
}

impl ChatWebSocket {
    pub fn new(chat_id: String, state: AppState) -> Self {
        let heartbeat_interval = Duration::from_secs(state.config.websocket.heartbeat_interval_secs);
        let client_timeout = Duration::from_secs(state.config.websocket.client_timeout_secs);

        Self {
            chat_id,
            state,
            heartbeat_interval,
            client_timeout,
            last_heartbeat: Instant::now(),
        }
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        if let Some(json) = message.to_json() {
            ctx.text(json);
        }
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => {
                let reply = self.state.replies.reply(&message.content);
                debug!(chat_id = %self.chat_id, "Replying to {} chars", message.content.chars().count());
                self.send(ctx, &ServerMessage::ai_response(reply));
            }
            Err(err) => {
                warn!(chat_id = %self.chat_id, "Invalid JSON from client: {}", err);
                self.send(
                    ctx,
                    &ServerMessage::Error {
                        code: "invalid_json".to_string(),
                        message: format!("Invalid JSON: {}", err),
                    },
                );
            }
        }
    }

    fn handle_audio(&mut self, data: &[u8], ctx: &mut ws::WebsocketContext<Self>) {
        debug!(chat_id = %self.chat_id, "Received {} bytes of audio data", data.len());
        let transcript = self.state.transcriber.transcribe_stream(data.len());
        self.send(ctx, &ServerMessage::transcription(transcript));
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                warn!(chat_id = %act.chat_id, "WebSocket heartbeat timeout, closing connection");
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }
}

impl Actor for ChatWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if self.state.registry.connect(&self.chat_id, ctx.address()).is_some() {
            warn!(chat_id = %self.chat_id, "Chat reconnected, previous connection replaced");
        }
        self.state.increment_active_sessions();
        info!(chat_id = %self.chat_id, "Chat connected");

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        if !self.state.registry.release(&self.chat_id, &ctx.address()) {
            debug!(chat_id = %self.chat_id, "Registry entry already replaced or removed");
        }
        self.state.decrement_active_sessions();
        info!(chat_id = %self.chat_id, "Chat disconnected");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                self.handle_text(&text, ctx);
            }
            Ok(ws::Message::Binary(data)) => {
                self.last_heartbeat = Instant::now();
                self.handle_audio(&data, ctx);
            }
            Ok(ws::Message::Ping(data)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                info!(chat_id = %self.chat_id, "WebSocket closed by client: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                // Fragmented messages are not part of the protocol
                warn!(chat_id = %self.chat_id, "Received unexpected continuation frame");
                ctx.stop();
            }
            Ok(ws::Message::Nop) => {}
            Err(err) => {
                error!(chat_id = %self.chat_id, "WebSocket protocol error: {}", err);
                ctx.stop();
            }
        }
    }
}

impl Handler<Push> for ChatWebSocket {
    type Result = ();

    fn handle(&mut self, msg: Push, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Handler<Evict> for ChatWebSocket {
    type Result = ();

    fn handle(&mut self, _msg: Evict, ctx: &mut Self::Context) {
        info!(chat_id = %self.chat_id, "Closing chat session on server request");
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Normal,
            description: Some("session disconnected".to_string()),
        }));
        ctx.stop();
    }
}

/// WebSocket endpoint handler.
///
/// ## HTTP to WebSocket Upgrade:
/// This function handles the initial HTTP request and upgrades it to a WebSocket connection.
/// The actual WebSocket communication is handled by the ChatWebSocket actor.
pub async fn chat_websocket(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let chat_id = path.into_inner();
    debug!("WebSocket upgrade for chat {} from {:?}", chat_id, req.connection_info().peer_addr());

    ws::start(ChatWebSocket::new(chat_id, state.get_ref().clone()), &req, stream)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::state::test_support::app_state_with;
    use crate::storage::memory::MemoryStorage;
    use actix_web::test as actix_test;
    use actix_web::App;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Server text frames are unmasked: FIN+text opcode, then a 7-bit length
    /// for short payloads.
    fn text_payload(frame: &[u8]) -> &str {
        assert_eq!(frame[0], 0x81, "not a text frame");
        std::str::from_utf8(&frame[2..]).unwrap()
    }

    #[test]
    fn test_server_message_serialization() {
        let json = ServerMessage::ai_response("hi".to_string()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "ai_response");
        assert_eq!(value["content"], "hi");
        assert_eq!(value["status"], "completed");

        let json = ServerMessage::Error {
            code: "invalid_json".to_string(),
            message: "bad".to_string(),
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains("invalid_json"));
    }

    #[test]
    fn test_client_message_defaults_content() {
        let message: ClientMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(message.content, "");
    }

    #[actix_web::test]
    async fn test_upgrade_handshake() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/ws/chat/{chat_id}", web::get().to(chat_websocket)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/ws/chat/abc")
            .insert_header(("upgrade", "websocket"))
            .insert_header(("connection", "upgrade"))
            .insert_header(("sec-websocket-version", "13"))
            .insert_header(("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::SWITCHING_PROTOCOLS);

        let req = actix_test::TestRequest::get().uri("/ws/chat/abc").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());
    }

    #[actix_web::test]
    async fn test_session_registers_and_receives_pushes() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_session(&state, "chat-1", tx);
        let addr = wait_for_registration(&state, "chat-1", None).await;
        assert_eq!(state.get_metrics_snapshot().active_sessions, 1);

        addr.send(Push("hello".to_string())).await.unwrap();
        let frame = rx.recv().await.unwrap();
        assert_eq!(text_payload(&frame), "hello");
    }

    #[actix_web::test]
    async fn test_evicted_session_closes_and_unregisters() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_session(&state, "chat-2", tx);
        let addr = wait_for_registration(&state, "chat-2", None).await;
        addr.do_send(Evict);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame[0], 0x88, "expected a close frame");

        wait_for_sessions(&state, 0).await;
        assert!(state.registry.get("chat-2").is_none());
    }

    #[actix_web::test]
    async fn test_replaced_session_does_not_evict_successor() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        spawn_session(&state, "shared", tx1);
        let first = wait_for_registration(&state, "shared", None).await;
        spawn_session(&state, "shared", tx2);
        let second = wait_for_registration(&state, "shared", Some(&first)).await;
        assert_eq!(state.get_metrics_snapshot().active_sessions, 2);

        first.do_send(Evict);
        wait_for_sessions(&state, 1).await;

        assert!(state.registry.get("shared") == Some(second));
    }

    #[actix_web::test]
    async fn test_inbound_frames_are_answered_in_order() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let input = vec![
            client_frame(OP_TEXT, br#"{"content":"hello"}"#),
            client_frame(OP_TEXT, b"not json"),
            client_frame(OP_BINARY, &[0u8; 100]),
            client_frame(OP_PING, b"hb"),
            client_frame(OP_TEXT, b"{}"),
        ];
        spawn_session_with_input(&state, "chat-in", input, tx);

        let frames = recv_frames(&mut rx, 5).await;
        let json = |payload: &[u8]| serde_json::from_slice::<serde_json::Value>(payload).unwrap();

        assert_eq!(frames[0].0, OP_TEXT);
        let reply = json(&frames[0].1);
        assert_eq!(reply["type"], "ai_response");
        assert_eq!(reply["status"], "completed");
        assert!(reply["content"].as_str().unwrap().contains("\"hello\""));

        let error = json(&frames[1].1);
        assert_eq!(error["type"], "error");
        assert_eq!(error["code"], "invalid_json");

        // The connection survived the bad frame and keeps answering
        let transcript = json(&frames[2].1);
        assert_eq!(transcript["type"], "transcription");
        assert_eq!(transcript["status"], "completed");
        assert!(transcript["content"]
            .as_str()
            .unwrap()
            .starts_with(crate::transcription::mock::STREAM_PREFIX));

        assert_eq!(frames[3], (OP_PONG, b"hb".to_vec()));

        // Missing `content` is treated as an empty message
        let empty = json(&frames[4].1);
        assert_eq!(empty["type"], "ai_response");
        assert!(empty["content"].as_str().unwrap().contains("\"\""));

        assert_eq!(state.get_metrics_snapshot().active_sessions, 1);
        assert!(state.registry.get("chat-in").is_some());
    }

    #[actix_web::test]
    async fn test_client_close_unregisters_session() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Close payload: status code 1000
        let input = vec![client_frame(OP_CLOSE, &1000u16.to_be_bytes())];
        spawn_session_with_input(&state, "chat-bye", input, tx);

        let frames = recv_frames(&mut rx, 1).await;
        assert_eq!(frames[0].0, OP_CLOSE);

        wait_for_sessions(&state, 0).await;
        assert!(state.registry.get("chat-bye").is_none());
    }
}
