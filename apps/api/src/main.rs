mod chatbot;
mod config;
mod deploy;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::chatbot::ChatAssistant;
use crate::config::Config;
use crate::deploy::hosting::VercelClient;
use crate::deploy::source_control::GitHubClient;
use crate::deploy::workspace::FsRemover;
use crate::deploy::{Orchestrator, OrchestratorSettings};
use crate::extraction::ResumeExtractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));
    info!(services = ?config.services, "Service configuration loaded");

    // Deployment collaborators
    let github = GitHubClient::new(
        config.github_username.clone(),
        config.services.source_control_token.clone(),
    )
    .context("Failed to build GitHub client")?;
    let vercel = VercelClient::new(
        config.services.hosting_token.clone(),
        config.vercel_team_id.clone(),
    )
    .context("Failed to build Vercel client")?;

    let orchestrator = Orchestrator::new(
        OrchestratorSettings {
            templates_dir: config.templates_dir.clone(),
            uploads_root: config.uploads_root.clone(),
            work_dir: config.work_dir.clone(),
            poll: config.poll,
        },
        Arc::new(github),
        Arc::new(vercel),
        Arc::new(FsRemover),
    );
    info!(
        templates_dir = %config.templates_dir.display(),
        work_dir = %config.work_dir.display(),
        poll_interval_secs = config.poll.interval.as_secs(),
        poll_max_attempts = config.poll.max_attempts,
        "Deployment orchestrator initialized"
    );

    // Resume extraction is optional
    let extractor = match &config.services.llm_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone()).context("Failed to build LLM client")?;
            let extractor = ResumeExtractor::new(
                Arc::new(llm),
                config.services.model_priority_list.clone(),
            );
            info!(models = ?extractor.models(), "Resume extractor initialized");
            Some(Arc::new(extractor))
        }
        None => {
            warn!("GEMINI_API_KEY_EXTRACT not set; resume extraction disabled");
            None
        }
    };

    // Portfolio assistant chat is optional
    let chat = match &config.services.chat_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone()).context("Failed to build chat LLM client")?;
            let assistant = ChatAssistant::new(
                Arc::new(llm),
                config.services.chat_model_priority_list.clone(),
            );
            info!(models = ?assistant.models(), "Chat assistant initialized");
            Some(Arc::new(assistant))
        }
        None => {
            warn!("GEMINI_API_KEY_CHATBOT not set; chat disabled");
            None
        }
    };

    // Build app state
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        extractor,
        chat,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
