use std::sync::Arc;

use crate::chatbot::ChatAssistant;
use crate::deploy::Orchestrator;
use crate::extraction::ResumeExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// `None` when no LLM API key is configured; extraction requests are refused.
    pub extractor: Option<Arc<ResumeExtractor>>,
    /// `None` when no chat API key is configured; chat requests are refused.
    pub chat: Option<Arc<ChatAssistant>>,
}
