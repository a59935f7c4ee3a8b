//! Chat API endpoint for response generation

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::conversation::{Role, Turn};

/// Build chat router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/respond", post(respond))
        .with_state(state)
}

/// Response generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub text: String,
    #[serde(default)]
    pub conversation_history: Vec<Turn>,
}

/// Response generation result
#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub response: String,
}

/// Generate the assistant reply for the supplied conversation
///
/// The history is forwarded in exactly the order received (oldest first).
/// If the history does not already end with the user's text as its final
/// turn, the text is appended as one; clients that pre-append it are not
/// double-counted.
async fn respond(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("no text to respond to".to_string()));
    }

    let mut turns = request.conversation_history;
    let already_appended = turns
        .last()
        .is_some_and(|t| t.role == Role::User && t.content == request.text);
    if !already_appended {
        turns.push(Turn::user(request.text));
    }

    let response = state.responder.respond(&turns).await?;

    Ok(Json(RespondResponse { response }))
}
