use agent::AgentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

/// `message` フィールドが欠けている場合のエラーメッセージ
pub const MISSING_MESSAGE_ERROR: &str = "The \"message\" field is required";

/// HTTP API のエラー型
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl ApiError {
    pub fn missing_message() -> Self {
        Self::BadRequest(MISSING_MESSAGE_ERROR.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// エラー時のレスポンスボディ
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Chat request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
            status: "error",
        };
        (status, Json(body)).into_response()
    }
}
