use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use wayfare_chat::{ChatTurnRequest, ChatTurnResponse};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<Uuid>,
    #[serde(rename = "userId")]
    pub user_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(chat_turn))
}

/// The conversational endpoint. Always HTTP 200, even on internal
/// failure, so the chat UI stays functional; the envelope carries the
/// error fields instead.
async fn chat_turn(
    State(state): State<AppState>,
    Json(body): Json<ChatRequestBody>,
) -> Json<ChatTurnResponse> {
    if body.message.trim().is_empty() {
        return Json(ChatTurnResponse {
            response: "Please type a message describing where you'd like to fly.".to_string(),
            conversation_id: body.conversation_id.unwrap_or_else(Uuid::new_v4),
            error: true,
            error_type: Some("validation_error".to_string()),
        });
    }

    let response = state
        .orchestrator
        .handle_message(ChatTurnRequest {
            message: body.message,
            conversation_id: body.conversation_id,
            user_id: body.user_id,
        })
        .await;

    Json(response)
}
