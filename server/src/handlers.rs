use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::http::ServerState;

/// `/examples` が返すプロンプト例
pub const EXAMPLE_PROMPTS: [&str; 2] = [
    "Hello, how can you assist me today? I need help generating user stories for a web application.",
    "Write user stories with acceptance criteria for the login and registration flow of an online store.",
];

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub agent_id: String,
    pub region: String,
}

#[derive(Debug, Serialize)]
pub struct ExamplesResponse {
    pub examples: Vec<String>,
    pub status: String,
}

/// GET /health
///
/// Agent への通信は行わない。
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Bedrock agent server is running".to_string(),
        agent_id: state.agent.agent_id().to_string(),
        region: state.agent.region().to_string(),
    })
}

/// POST /chat
///
/// ボディが空、JSON でない、または `message` が文字列でない場合は 400。
pub async fn chat(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected chat request: {}", e);
        ApiError::missing_message()
    })?;

    info!(chars = request.message.chars().count(), "Chat request received");
    let response = state.agent.invoke(&request.message).await?;

    Ok(Json(ChatResponse {
        response,
        status: "success".to_string(),
    }))
}

/// GET /examples
pub async fn examples() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        examples: EXAMPLE_PROMPTS.iter().map(|s| s.to_string()).collect(),
        status: "success".to_string(),
    })
}
