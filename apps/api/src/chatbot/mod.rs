//! Portfolio assistant chat: answers a builder's question about their site,
//! walking the chat model list in priority order. Each model gets a bounded
//! amount of time before the next one is tried.

pub mod handlers;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::chatbot::prompts::build_chat_system;
use crate::llm_client::fallback::{attempt_in_order, FallbackError};
use crate::llm_client::{CompletionProvider, LlmError, ResponseFormat};

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Per-model time budget.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between one failed model and the next.
pub const CHAT_BACKOFF: Duration = Duration::from_millis(500);

/// Where the user is in the builder when they ask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub form_section: Option<String>,
    #[serde(default)]
    pub user_query: Option<String>,
}

#[derive(Debug)]
pub struct ChatReply {
    pub message: String,
    /// The model that answered.
    pub model: String,
}

pub struct ChatAssistant {
    provider: Arc<dyn CompletionProvider>,
    models: Vec<String>,
    backoff: Duration,
    timeout: Duration,
}

impl ChatAssistant {
    pub fn new(provider: Arc<dyn CompletionProvider>, models: Vec<String>) -> Self {
        Self {
            provider,
            models,
            backoff: CHAT_BACKOFF,
            timeout: ATTEMPT_TIMEOUT,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Answers `message`. A blank or timed-out answer counts as a failed
    /// attempt and moves on to the next model.
    pub async fn reply(
        &self,
        message: &str,
        context: Option<&ChatContext>,
    ) -> Result<ChatReply, FallbackError> {
        let system = build_chat_system(context);
        let timeout = self.timeout;

        let (model, text) = attempt_in_order(&self.models, self.backoff, LlmError::classify, |model| {
            let model = model.to_string();
            let system = &system;
            async move {
                let text = tokio::time::timeout(
                    timeout,
                    self.provider
                        .complete(&model, message, system, ResponseFormat::Text),
                )
                .await
                .map_err(|_| LlmError::Timeout(timeout))??;

                let text = text.trim();
                if text.is_empty() {
                    Err(LlmError::EmptyContent)
                } else {
                    Ok(text.to_string())
                }
            }
        })
        .await?;

        info!(model = %model, chars = text.chars().count(), "Chat reply generated");
        Ok(ChatReply {
            message: text,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fallback::FailureClass;
    use crate::llm_client::testing::ScriptedProvider;

    fn models() -> Vec<String> {
        vec![
            "gemini-2.5-flash".into(),
            "gemini-2.5-flash-lite".into(),
            "gemini-2.0-flash".into(),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_model_answers_in_plain_text() {
        let provider = Arc::new(
            ScriptedProvider::new().answering("gemini-2.5-flash", "  Lead with your best project.\n"),
        );

        let reply = ChatAssistant::new(provider.clone(), models())
            .reply("How should I order my projects?", None)
            .await
            .unwrap();

        assert_eq!(reply.model, "gemini-2.5-flash");
        assert_eq!(reply.message, "Lead with your best project.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "How should I order my projects?");
        assert_eq!(requests[0].format, ResponseFormat::Text);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_model_times_out_and_next_one_answers() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .stalling("gemini-2.5-flash")
                .answering("gemini-2.5-flash-lite", "Use a dark palette."),
        );
        let started = tokio::time::Instant::now();

        let reply = ChatAssistant::new(provider, models())
            .reply("Colors?", None)
            .await
            .unwrap();

        assert_eq!(reply.model, "gemini-2.5-flash-lite");
        let elapsed = started.elapsed();
        assert!(elapsed >= ATTEMPT_TIMEOUT + CHAT_BACKOFF && elapsed < ATTEMPT_TIMEOUT * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_answer_moves_to_next_model() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .answering("gemini-2.5-flash", "   ")
                .answering("gemini-2.5-flash-lite", "Keep it short."),
        );

        let reply = ChatAssistant::new(provider, models())
            .reply("Tips?", None)
            .await
            .unwrap();

        assert_eq!(reply.model, "gemini-2.5-flash-lite");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_model_timing_out_is_reported_as_timeouts() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .stalling("gemini-2.5-flash")
                .stalling("gemini-2.5-flash-lite")
                .stalling("gemini-2.0-flash"),
        );

        let err = ChatAssistant::new(provider, models())
            .reply("Hello?", None)
            .await
            .unwrap_err();

        assert_eq!(err.failures().len(), 3);
        assert!(err.failures().iter().all(|f| f.class == FailureClass::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_reaches_system_prompt() {
        let provider = Arc::new(ScriptedProvider::new().answering("gemini-2.5-flash", "ok"));
        let context = ChatContext {
            template_name: Some("Minimal Dark".into()),
            form_section: Some("projects".into()),
            user_query: None,
        };

        ChatAssistant::new(provider.clone(), models())
            .reply("What next?", Some(&context))
            .await
            .unwrap();

        let system = &provider.requests()[0].system;
        assert!(system.contains("Selected Template: Minimal Dark"));
        assert!(system.contains("Current Section: projects"));
        assert!(!system.contains("User Query Type"));
    }
}
