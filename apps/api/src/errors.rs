use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::llm_client::fallback::{FailureClass, FallbackError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// A client error that carries its own machine-readable code.
    #[error("{message}")]
    Rejected { code: &'static str, message: String },

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Resume extraction is not configured")]
    ExtractionUnavailable,

    #[error("Chat error: {0}")]
    Chat(FallbackError),

    #[error("Chatbot service is not configured")]
    ChatUnavailable,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Rejected { code, message } => (StatusCode::BAD_REQUEST, *code, message.clone()),
            AppError::Deploy(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, e.kind(), e.to_string())
            }
            AppError::Deploy(e) => {
                tracing::error!(code = e.kind(), "Deployment error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.kind(), e.to_string())
            }
            AppError::Extraction(msg) => {
                tracing::error!("Extraction error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXTRACTION_ERROR",
                    msg.clone(),
                )
            }
            AppError::ExtractionUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "EXTRACTION_UNAVAILABLE",
                self.to_string(),
            ),
            AppError::Chat(e) => {
                tracing::error!("Chat error: {e}");
                chat_failure_parts(e)
            }
            AppError::ChatUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CHATBOT_UNAVAILABLE",
                self.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

/// Chat failures are reported by how the last attempted model failed.
fn chat_failure_parts(e: &FallbackError) -> (StatusCode, &'static str, String) {
    let (status, code, message) = match e.failures().last().map(|f| f.class) {
        Some(FailureClass::Quota) => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMIT_ERROR",
            "Too many requests. Please wait a moment and try again.",
        ),
        Some(FailureClass::Timeout) => (
            StatusCode::GATEWAY_TIMEOUT,
            "TIMEOUT_ERROR",
            "The AI service took too long to respond. Please try again with a shorter message.",
        ),
        Some(FailureClass::Network) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "NETWORK_ERROR",
            "Unable to connect to AI service.",
        ),
        Some(FailureClass::Terminal) => (
            StatusCode::BAD_GATEWAY,
            "AUTH_ERROR",
            "Authentication failed with AI service. Please contact administrator.",
        ),
        Some(FailureClass::Blocked) => (
            StatusCode::BAD_REQUEST,
            "CONTENT_FILTER_ERROR",
            "Your message couldn't be processed due to content guidelines. Please rephrase and try again.",
        ),
        Some(FailureClass::NotFound | FailureClass::Other) | None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An unexpected error occurred. Please try again later.",
        ),
    };
    (status, code, message.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "success": false,
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}
