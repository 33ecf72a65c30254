/// LLM Client: the single point of entry for generative-text calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions go through `CompletionProvider`, which `LlmClient`
/// implements against the `generateContent` endpoint.
///
/// The model is chosen per call; ordering and fallback between models is the
/// caller's concern.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod fallback;
pub mod prompts;
#[cfg(test)]
pub(crate) mod testing;

use self::fallback::FailureClass;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM blocked the request: {0}")]
    Blocked(String),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// How a model-fallback loop should treat this failure.
    pub fn classify(&self) -> FailureClass {
        match self {
            LlmError::Http(e) if e.is_timeout() => FailureClass::Timeout,
            LlmError::Timeout(_) => FailureClass::Timeout,
            LlmError::Http(e) if e.is_connect() => FailureClass::Network,
            LlmError::Blocked(_) => FailureClass::Blocked,
            LlmError::Api { status: 429, .. } => FailureClass::Quota,
            LlmError::Api { status: 404, .. } => FailureClass::NotFound,
            LlmError::Api { status: 401 | 403, .. } => FailureClass::Terminal,
            LlmError::Api { status: 400, message } if message.contains("API key") => {
                FailureClass::Terminal
            }
            LlmError::Api { message, .. } if message.to_lowercase().contains("quota") => {
                FailureClass::Quota
            }
            _ => FailureClass::Other,
        }
    }
}

/// What the model is asked to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

impl ResponseFormat {
    fn mime_type(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Text => "text/plain",
        }
    }
}

/// A text-completion backend. Production uses `LlmClient`; tests script it.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Extracts the text of the first candidate's first text part.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }

    /// Why the prompt was refused, when safety filtering blocked it.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by the service.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
        })
    }

    /// Makes one `generateContent` call, returning the full response object.
    /// No retries: a failed call is reported so the caller can move to the
    /// next model.
    pub async fn call(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: format.mime_type(),
            },
        };

        let response = self
            .client
            .post(format!("{GEMINI_API_BASE}/{model}:generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        if let Some(usage) = &llm_response.usage_metadata {
            debug!(
                model,
                input_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "LLM call succeeded"
            );
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError> {
        let response = self.call(model, prompt, system, format).await?;
        match (response.text(), response.block_reason()) {
            (Some(text), _) if !text.trim().is_empty() => Ok(text.to_string()),
            (_, Some(reason)) => Err(LlmError::Blocked(reason.to_string())),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

/// Deserializes model output, tolerating markdown code fences around the JSON.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
