use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::chatbot::{ChatContext, MAX_MESSAGE_CHARS};
use crate::errors::AppError;
use crate::state::AppState;

/// Loosely typed so each malformed field gets its own error code.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds spent answering.
    pub response_time: u64,
}

fn rejected(code: &'static str, message: impl Into<String>) -> AppError {
    AppError::Rejected {
        code,
        message: message.into(),
    }
}

/// Returns the trimmed message or the rejection for it.
fn validate_message(message: Option<&Value>) -> Result<&str, AppError> {
    let text = match message {
        None | Some(Value::Null) => return Err(rejected("MISSING_MESSAGE", "Message is required")),
        Some(Value::String(s)) if s.is_empty() => {
            return Err(rejected("MISSING_MESSAGE", "Message is required"))
        }
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(rejected("INVALID_MESSAGE_TYPE", "Message must be a text string")),
    };

    if text.is_empty() {
        return Err(rejected("EMPTY_MESSAGE", "Message cannot be empty"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(rejected(
            "MESSAGE_TOO_LONG",
            format!("Message is too long. Maximum {MAX_MESSAGE_CHARS} characters allowed."),
        ));
    }
    Ok(text)
}

fn validate_context(context: Option<Value>) -> Result<Option<ChatContext>, AppError> {
    match context {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(|_| rejected("INVALID_CONTEXT", "Context fields must be text")),
        Some(_) => Err(rejected("INVALID_CONTEXT", "Context must be an object")),
    }
}

/// POST /api/chatbot/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let started = Instant::now();
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let message = validate_message(req.message.as_ref())?;
    let context = validate_context(req.context)?;
    let assistant = state.chat.as_ref().ok_or(AppError::ChatUnavailable)?;

    let reply = assistant
        .reply(message, context.as_ref())
        .await
        .map_err(AppError::Chat)?;

    Ok(Json(ChatResponse {
        success: true,
        message: reply.message,
        model: reply.model,
        timestamp: Utc::now(),
        response_time: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }))
}
