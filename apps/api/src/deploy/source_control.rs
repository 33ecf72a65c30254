//! Source-control capability: create a remote repository and push a local
//! directory to it. `GitHubClient` is the production implementation; the
//! REST API creates the repository and the `git` CLI performs the push.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

const GITHUB_API_URL: &str = "https://api.github.com";
const CREATE_TIMEOUT: Duration = Duration::from_secs(10);
pub const COMMIT_MESSAGE: &str = "Initial commit: Portfolio Website generated";
pub const PRIMARY_BRANCH: &str = "main";

#[derive(Debug, Error)]
pub enum SourceControlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("failed to launch git: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A freshly created remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    pub name: String,
    /// Browser URL, returned to the caller.
    pub html_url: String,
    /// HTTPS clone URL, used as the push remote.
    pub clone_url: String,
}

#[async_trait]
pub trait SourceControl: Send + Sync {
    async fn create_repository(&self, name: &str, private: bool) -> Result<RepoHandle, SourceControlError>;

    /// Commits everything in `local_dir` once and pushes it as the primary branch.
    async fn push(&self, local_dir: &Path, repo: &RepoHandle) -> Result<(), SourceControlError>;
}

// ────────────────────────────────────────────────────────────────────────────
// GitHub
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct CreateRepoResponse {
    name: String,
    html_url: String,
    clone_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<GitHubErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorDetail {
    message: Option<String>,
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    username: String,
    token: String,
}

impl GitHubClient {
    pub fn new(username: String, token: String) -> Result<Self, SourceControlError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("portfolio-api/", env!("CARGO_PKG_VERSION")))
                .build()?,
            username,
            token,
        })
    }

    /// Runs one git subcommand in `dir`. `label` is what gets logged and
    /// reported, so it must never contain the token. With `authenticate`, the
    /// token reaches git through environment-supplied config only.
    async fn git(
        &self,
        dir: &Path,
        label: &str,
        args: &[&str],
        authenticate: bool,
    ) -> Result<(), SourceControlError> {
        debug!("git {label}");
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0");
        if authenticate {
            command.envs(auth_env(&self.token));
        }
        let output = command.output().await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(SourceControlError::Git {
            command: label.to_string(),
            stderr: redact(stderr.trim(), &self.token),
        })
    }

    fn commit_email(&self) -> String {
        format!("{}@users.noreply.github.com", self.username)
    }
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn create_repository(&self, name: &str, private: bool) -> Result<RepoHandle, SourceControlError> {
        let response = self
            .client
            .post(format!("{GITHUB_API_URL}/user/repos"))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .timeout(CREATE_TIMEOUT)
            .json(&CreateRepoRequest {
                name,
                private,
                auto_init: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceControlError::Api {
                status: status.as_u16(),
                message: github_error_message(&body),
            });
        }

        let created: CreateRepoResponse = response.json().await?;
        Ok(RepoHandle {
            name: created.name,
            html_url: created.html_url,
            clone_url: created.clone_url,
        })
    }

    async fn push(&self, local_dir: &Path, repo: &RepoHandle) -> Result<(), SourceControlError> {
        let name_cfg = format!("user.name={}", self.username);
        let email_cfg = format!("user.email={}", self.commit_email());

        self.git(local_dir, "init", &["init"], false).await?;
        self.git(local_dir, "add", &["add", "-A"], false).await?;
        self.git(
            local_dir,
            "commit",
            &["-c", &name_cfg, "-c", &email_cfg, "commit", "-m", COMMIT_MESSAGE],
            false,
        )
        .await?;
        self.git(local_dir, "branch", &["branch", "-M", PRIMARY_BRANCH], false)
            .await?;
        self.git(
            local_dir,
            "remote add",
            &["remote", "add", "origin", &repo.clone_url],
            false,
        )
        .await?;
        self.git(local_dir, "push", &["push", "origin", PRIMARY_BRANCH], true)
            .await?;
        Ok(())
    }
}

/// An `http.extraheader` basic-auth entry in git's `GIT_CONFIG_*` form. It is
/// visible only in the child's environment, never in argv or `.git/config`.
fn auth_env(token: &str) -> [(&'static str, String); 3] {
    let credentials = STANDARD.encode(format!("x-access-token:{token}"));
    [
        ("GIT_CONFIG_COUNT", "1".to_string()),
        ("GIT_CONFIG_KEY_0", "http.extraheader".to_string()),
        ("GIT_CONFIG_VALUE_0", format!("AUTHORIZATION: basic {credentials}")),
    ]
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "***")
    }
}

/// GitHub puts the useful part (e.g. "name already exists on this account")
/// in `errors[].message`, with a generic top-level `message`.
fn github_error_message(body: &str) -> String {
    match serde_json::from_str::<GitHubErrorBody>(body) {
        Ok(parsed) => {
            let details: Vec<String> = parsed.errors.into_iter().filter_map(|e| e.message).collect();
            if details.is_empty() {
                parsed.message
            } else {
                format!("{}: {}", parsed.message, details.join("; "))
            }
        }
        Err(_) if body.trim().is_empty() => {
            "Failed to create GitHub repository. Please check your GitHub token.".to_string()
        }
        Err(_) => body.to_string(),
    }
}
