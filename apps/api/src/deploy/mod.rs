// Deployment orchestration: render → publish + trigger (concurrent) → poll → cleanup.
// External services are reached only through the `SourceControl` and
// `HostingPlatform` traits so the whole flow runs against fakes in tests.

pub mod assets;
pub mod handlers;
pub mod hosting;
pub mod orchestrator;
pub mod poller;
pub mod publisher;
pub mod renderer;
pub mod slug;
pub mod source_control;
pub mod trigger;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use orchestrator::{JobOutcome, Orchestrator, OrchestratorSettings};
pub use renderer::TemplateSelector;

/// Every way a deployment job can fail. Each variant is fatal to the job.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{0}")]
    Validation(String),

    #[error("Template {0} not found")]
    TemplateNotFound(String),

    #[error("Failed to render site: {0}")]
    Render(String),

    #[error("Failed to create repository: {0}")]
    RepoCreation(String),

    #[error("Failed to push to repository: {0}")]
    Push(String),

    #[error("Failed to create deployment: {0}")]
    DeployTrigger(String),

    #[error("{0}")]
    DeploymentFailed(String),

    #[error("Deployment was canceled")]
    DeploymentCanceled,

    #[error(
        "Deployment did not complete after {attempts} status checks{}",
        timeout_suffix(.last_error)
    )]
    DeploymentTimeout {
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("Deployment check failed: {0}")]
    DeploymentCheck(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    /// Stable machine-readable code, used in API responses and job records.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployError::Validation(_) => "VALIDATION_ERROR",
            DeployError::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            DeployError::Render(_) => "RENDER_ERROR",
            DeployError::RepoCreation(_) => "REPO_CREATION_ERROR",
            DeployError::Push(_) => "PUSH_ERROR",
            DeployError::DeployTrigger(_) => "DEPLOY_TRIGGER_ERROR",
            DeployError::DeploymentFailed(_) => "DEPLOYMENT_FAILED",
            DeployError::DeploymentCanceled => "DEPLOYMENT_CANCELED",
            DeployError::DeploymentTimeout { .. } => "DEPLOYMENT_TIMEOUT",
            DeployError::DeploymentCheck(_) => "DEPLOYMENT_CHECK_ERROR",
            DeployError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures caused by the caller's input rather than the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DeployError::Validation(_))
    }
}

fn timeout_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {e})"),
        None => ". Please check the hosting dashboard.".to_string(),
    }
}
