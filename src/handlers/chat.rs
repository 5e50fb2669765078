use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Conversation, Envelope};
use crate::services::conversation;
use crate::state::AppState;

// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| chat_session(socket, state))
}

/// One conversation per socket; it lives as long as the connection.
async fn chat_session(mut socket: WebSocket, state: Arc<AppState>) {
    let mut conv = Conversation::new(Uuid::new_v4().to_string());
    tracing::info!(session = %conv.session_id, "chat session opened");

    let greeting = Envelope::Response {
        text: conversation::GREETING.to_string(),
    };
    if send(&mut socket, &greeting).await.is_err() {
        return;
    }

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, session = %conv.session_id, "websocket receive failed");
                break;
            }
        };

        let reply = match msg {
            Message::Text(raw) => match serde_json::from_str::<Envelope>(&raw) {
                Ok(Envelope::UserInput { text }) => Envelope::Response {
                    text: conversation::process_message(&state, &mut conv, &text).await,
                },
                Ok(_) => Envelope::Error {
                    text: "Expected a user_input message.".to_string(),
                },
                Err(e) => {
                    tracing::debug!(error = %e, "malformed chat envelope");
                    Envelope::Error {
                        text: "Sorry, I couldn't read that message.".to_string(),
                    }
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        if send(&mut socket, &reply).await.is_err() {
            break;
        }
    }

    tracing::info!(session = %conv.session_id, "chat session closed");
}

async fn send(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(envelope).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload)).await
}

// POST /api/chat
#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub text: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub text: String,
    pub state: &'static str,
}

pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let (text, conv_state) =
        conversation::process_session_message(&state, &session_id, payload.text.trim()).await;

    Json(ChatResponse {
        session_id,
        text,
        state: conv_state.as_str(),
    })
}
