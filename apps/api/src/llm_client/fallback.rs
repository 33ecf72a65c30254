//! Ordered capability attempts: try each model in priority order until one
//! succeeds, pausing briefly between attempts.
//!
//! A `Terminal` failure (e.g. a rejected credential) would fail the same way
//! on every model, so it stops the walk at once.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

/// Default pause between one failed model and the next.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Quota,
    Timeout,
    NotFound,
    Terminal,
    Network,
    /// Safety filtering refused the prompt.
    Blocked,
    Other,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureClass::Quota => "quota exceeded",
            FailureClass::Timeout => "timed out",
            FailureClass::NotFound => "not found",
            FailureClass::Terminal => "rejected",
            FailureClass::Network => "unreachable",
            FailureClass::Blocked => "blocked",
            FailureClass::Other => "failed",
        };
        f.write_str(label)
    }
}

/// One failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub model: String,
    pub class: FailureClass,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("No models configured")]
    NoModels,

    #[error("Model {} {}: {}", .0.model, .0.class, .0.message)]
    Terminal(AttemptFailure),

    #[error("All {} models failed; last: {}", .0.len(), summarize_last(.0))]
    Exhausted(Vec<AttemptFailure>),
}

impl FallbackError {
    /// Every recorded failure, in attempt order.
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            FallbackError::NoModels => &[],
            FallbackError::Terminal(f) => std::slice::from_ref(f),
            FallbackError::Exhausted(all) => all,
        }
    }

    /// True when every failure was a quota/rate limit.
    pub fn is_quota(&self) -> bool {
        let failures = self.failures();
        !failures.is_empty() && failures.iter().all(|f| f.class == FailureClass::Quota)
    }
}

fn summarize_last(failures: &[AttemptFailure]) -> String {
    failures
        .last()
        .map(|f| format!("{} {} ({})", f.model, f.class, f.message))
        .unwrap_or_default()
}

/// Runs `attempt` for each model in order and returns the first success along
/// with the model that produced it. No pause follows the final attempt.
pub async fn attempt_in_order<T, E, F, Fut>(
    models: &[String],
    backoff: Duration,
    classify: impl Fn(&E) -> FailureClass,
    mut attempt: F,
) -> Result<(String, T), FallbackError>
where
    E: fmt::Display,
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if models.is_empty() {
        return Err(FallbackError::NoModels);
    }

    let mut failures = Vec::with_capacity(models.len());

    for (i, model) in models.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(backoff).await;
        }

        info!(model = %model, attempt = i + 1, of = models.len(), "Attempting model");
        match attempt(model).await {
            Ok(value) => {
                info!(model = %model, "Model attempt succeeded");
                return Ok((model.clone(), value));
            }
            Err(e) => {
                let failure = AttemptFailure {
                    model: model.clone(),
                    class: classify(&e),
                    message: e.to_string(),
                };
                warn!(model = %model, class = ?failure.class, "Model attempt failed: {e}");
                if failure.class == FailureClass::Terminal {
                    return Err(FallbackError::Terminal(failure));
                }
                failures.push(failure);
            }
        }
    }

    Err(FallbackError::Exhausted(failures))
}
