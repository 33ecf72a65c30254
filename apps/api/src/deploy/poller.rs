//! Deployment Poller: drives a deployment from PENDING to a terminal state.
//!
//! ```text
//! PENDING ─poll─► QUEUED/INITIALIZING/BUILDING/… ─wait, poll─► READY(url) → live
//!                                                           ├─► ERROR     → DeploymentFailed
//!                                                           ├─► CANCELED  → DeploymentCanceled
//!           budget spent without a terminal state ──────────┴─► TIMEOUT   → DeploymentTimeout
//! ```
//!
//! READY without a usable URL is treated as still in progress. A 403/404 from
//! the status endpoint means the deployment id itself is bad and fails at once;
//! every other polling error just uses up an attempt.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PollSettings;
use crate::deploy::hosting::{DeploymentStatus, HostingError, HostingPlatform, ReadyState};
use crate::deploy::DeployError;

const UNKNOWN_FAILURE: &str = "Deployment failed with unknown error";

/// Where the poller currently believes the deployment is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    InProgress(ReadyState),
    Live(String),
    Failed(String),
    Canceled,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Live(_) | PollState::Failed(_) | PollState::Canceled | PollState::TimedOut
        )
    }
}

/// Next state after one observed status.
pub fn transition(status: &DeploymentStatus) -> PollState {
    match &status.state {
        ReadyState::Ready => match live_url(status) {
            Some(url) => PollState::Live(url),
            None => PollState::InProgress(ReadyState::Ready),
        },
        ReadyState::Error => PollState::Failed(
            status
                .error_message
                .clone()
                .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
        ),
        ReadyState::Canceled => PollState::Canceled,
        other => PollState::InProgress(other.clone()),
    }
}

/// Prefers `url`, falls back to the first non-blank alias; always `https://`.
pub fn live_url(status: &DeploymentStatus) -> Option<String> {
    status
        .url
        .iter()
        .chain(status.alias.iter())
        .map(|u| u.trim())
        .find(|u| !u.is_empty())
        .map(with_https)
}

fn with_https(host: &str) -> String {
    if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn is_fatal_check_error(error: &HostingError) -> bool {
    matches!(error.status(), Some(403) | Some(404))
}

#[derive(Clone)]
pub struct DeploymentPoller {
    hosting: Arc<dyn HostingPlatform>,
    settings: PollSettings,
}

impl DeploymentPoller {
    pub fn new(hosting: Arc<dyn HostingPlatform>, settings: PollSettings) -> Self {
        Self { hosting, settings }
    }

    /// Polls until the deployment is live and returns its URL.
    pub async fn wait_until_live(&self, deployment_id: &str) -> Result<String, DeployError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut state = PollState::Pending;
        let mut attempt = 0;
        let mut last_error: Option<String> = None;

        loop {
            if attempt == max_attempts {
                state = PollState::TimedOut;
            } else {
                if attempt > 0 {
                    tokio::time::sleep(self.settings.interval).await;
                }
                attempt += 1;

                match self.hosting.deployment_status(deployment_id).await {
                    Ok(status) => {
                        last_error = None;
                        state = transition(&status);
                        info!(
                            deployment_id,
                            attempt,
                            max_attempts,
                            state = ?status.state,
                            url = ?status.url,
                            "Deployment status check"
                        );
                        if state == PollState::InProgress(ReadyState::Ready) {
                            warn!(deployment_id, attempt, "Deployment ready but no URL found, retrying");
                        }
                    }
                    Err(e) if is_fatal_check_error(&e) => {
                        return Err(DeployError::DeploymentCheck(e.message()));
                    }
                    Err(e) => {
                        warn!(deployment_id, attempt, max_attempts, "Deployment status check error: {e}");
                        last_error = Some(e.message());
                    }
                }
            }

            if let Some(result) = settle(&state, attempt, &last_error) {
                match &result {
                    Ok(url) => info!(deployment_id, url = %url, "Deployment ready"),
                    Err(e) => warn!(deployment_id, attempt, "Deployment did not go live: {e}"),
                }
                return result;
            }
        }
    }
}

/// Maps a terminal state to the job result; `None` while still in flight.
fn settle(
    state: &PollState,
    attempts: u32,
    last_error: &Option<String>,
) -> Option<Result<String, DeployError>> {
    if !state.is_terminal() {
        return None;
    }
    Some(match state {
        PollState::Live(url) => Ok(url.clone()),
        PollState::Failed(message) => Err(DeployError::DeploymentFailed(message.clone())),
        PollState::Canceled => Err(DeployError::DeploymentCanceled),
        _ => Err(DeployError::DeploymentTimeout {
            attempts,
            last_error: last_error.clone(),
        }),
    })
}
