//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chanakya_core::ChanakyaError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Embedding or index lookup failed
    Retrieval(String),
    /// The language model call failed
    Generation(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ApiError) {
        let error = match self {
            AppError::Retrieval(msg) => {
                ApiError::new("RETRIEVAL_ERROR", "Failed to retrieve context").with_details(msg)
            }
            AppError::Generation(msg) => {
                ApiError::new("LLM_ERROR", "Failed to generate a response").with_details(msg)
            }
            AppError::Internal(msg) => {
                ApiError::new("INTERNAL_ERROR", "Internal server error").with_details(msg)
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "Request failed");
        let (status, error) = self.status_and_body();
        (status, Json(error)).into_response()
    }
}

impl From<ChanakyaError> for AppError {
    fn from(err: ChanakyaError) -> Self {
        match err {
            ChanakyaError::SearchError(msg)
            | ChanakyaError::EmbeddingError(msg)
            | ChanakyaError::StorageError(msg)
            | ChanakyaError::NotFound(msg) => AppError::Retrieval(msg),
            ChanakyaError::LlmError(msg) => AppError::Generation(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_errors_are_server_errors() {
        let cases = [
            (ChanakyaError::SearchError("dim".into()), "RETRIEVAL_ERROR"),
            (ChanakyaError::EmbeddingError("down".into()), "RETRIEVAL_ERROR"),
            (ChanakyaError::LlmError("quota".into()), "LLM_ERROR"),
            (ChanakyaError::ConfigError("key".into()), "INTERNAL_ERROR"),
        ];

        for (err, code) in cases {
            let (status, body) = AppError::from(err).status_and_body();
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body.code, code);
            assert!(body.details.is_some());
        }
    }

    #[test]
    fn test_details_omitted_when_absent() {
        let json = serde_json::to_value(ApiError::new("X", "y")).unwrap();
        assert!(json.get("details").is_none());
    }
}
