//! Resume extraction: turns resume text, typed in or read from an uploaded
//! PDF/DOCX/TXT file, into a `ProfileDocument` by asking the generative-text
//! service, walking the configured model list in priority order.

pub mod document;
pub mod handlers;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::llm_client::fallback::{attempt_in_order, FallbackError, DEFAULT_BACKOFF};
use crate::extraction::prompts::{build_extraction_prompt, extraction_system};
use crate::llm_client::{parse_json, CompletionProvider, LlmError, ResponseFormat};
use crate::models::profile::ProfileDocument;

/// Shorter input is almost certainly not a resume.
pub const MIN_RESUME_CHARS: usize = 50;

#[derive(Debug)]
pub struct Extraction {
    pub profile: ProfileDocument,
    /// The model that produced `profile`.
    pub model: String,
}

pub struct ResumeExtractor {
    provider: Arc<dyn CompletionProvider>,
    models: Vec<String>,
    backoff: Duration,
}

impl ResumeExtractor {
    pub fn new(provider: Arc<dyn CompletionProvider>, models: Vec<String>) -> Self {
        Self {
            provider,
            models,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Extracts a profile, trying each model until one returns parseable JSON.
    /// Malformed output counts as a failed attempt like any other.
    pub async fn extract(&self, resume_text: &str) -> Result<Extraction, FallbackError> {
        let prompt = build_extraction_prompt(resume_text);
        let system = extraction_system();

        let (model, profile) = attempt_in_order(
            &self.models,
            self.backoff,
            LlmError::classify,
            |model| {
                let model = model.to_string();
                let prompt = &prompt;
                let system = &system;
                async move {
                    let text = self
                        .provider
                        .complete(&model, prompt, system, ResponseFormat::Json)
                        .await?;
                    parse_json::<ProfileDocument>(&text)
                }
            },
        )
        .await?;

        info!(
            model = %model,
            has_name = profile.full_name().is_some(),
            projects = profile.projects.len(),
            "Resume extracted"
        );
        Ok(Extraction { profile, model })
    }
}
