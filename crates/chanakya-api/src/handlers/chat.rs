//! Persona chat handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Chat request body
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChatRequest {
    /// User's message, passed through unmodified
    #[schema(example = "How should a king choose his ministers?")]
    pub message: String,
}

/// Chat response body
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChatResponse {
    /// Chanakya's answer
    pub response: String,
}

/// Answer a message in Chanakya's voice
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer generated", body = ChatResponse),
        (status = 500, description = "Retrieval or generation failed", body = crate::error::ApiError)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let request_id = state.increment_requests();
    tracing::info!(request_id, message_chars = req.message.chars().count(), "Chat request");

    let answer = state.rag.ask(&req.message).await?;
    tracing::info!(
        request_id,
        passages = answer.sources.len(),
        processing_time_ms = answer.processing_time_ms,
        "Chat answered"
    );

    Ok(Json(ChatResponse {
        response: answer.response,
    }))
}
