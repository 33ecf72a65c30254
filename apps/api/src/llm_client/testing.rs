//! Scripted completion provider shared by the extraction and chat tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{CompletionProvider, LlmError, ResponseFormat};

enum Script {
    Answer(String),
    Fail(u16, String),
    Stall,
}

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: String,
    pub prompt: String,
    pub system: String,
    pub format: ResponseFormat,
}

/// Answers per model from a fixed table; unknown models are 404s.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(mut self, model: &str, text: &str) -> Self {
        self.scripts
            .insert(model.to_string(), Script::Answer(text.to_string()));
        self
    }

    pub fn failing(mut self, model: &str, status: u16, message: &str) -> Self {
        self.scripts
            .insert(model.to_string(), Script::Fail(status, message.to_string()));
        self
    }

    /// The model never answers; only a caller-side timeout ends the call.
    pub fn stalling(mut self, model: &str) -> Self {
        self.scripts.insert(model.to_string(), Script::Stall);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(Request {
            model: model.to_string(),
            prompt: prompt.to_string(),
            system: system.to_string(),
            format,
        });

        match self.scripts.get(model) {
            Some(Script::Answer(text)) => Ok(text.clone()),
            Some(Script::Fail(status, message)) => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
            Some(Script::Stall) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(LlmError::EmptyContent)
            }
            None => Err(LlmError::Api {
                status: 404,
                message: format!("models/{model} is not found"),
            }),
        }
    }
}
