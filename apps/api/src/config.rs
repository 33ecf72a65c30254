use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default model fallback order for resume extraction.
const DEFAULT_EXTRACTOR_MODELS: &str = "gemini-2.0-flash,gemini-pro,gemini-2.5-flash";

/// Default model fallback order for the portfolio assistant chat.
const DEFAULT_CHAT_MODELS: &str = "gemini-2.5-flash,gemini-2.5-flash-lite,gemini-2.0-flash";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub services: ServiceConfig,
    pub github_username: String,
    pub vercel_team_id: Option<String>,
    pub templates_dir: PathBuf,
    pub uploads_root: PathBuf,
    pub work_dir: PathBuf,
    pub poll: PollSettings,
    pub port: u16,
    pub rust_log: String,
}

/// Operator credentials and provider ordering, injected once into each
/// component at construction. Nothing below `main` reads the environment.
#[derive(Clone)]
pub struct ServiceConfig {
    pub source_control_token: String,
    pub hosting_token: String,
    pub llm_api_key: Option<String>,
    pub model_priority_list: Vec<String>,
    pub chat_api_key: Option<String>,
    pub chat_model_priority_list: Vec<String>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("source_control_token", &"<redacted>")
            .field("hosting_token", &"<redacted>")
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<redacted>"))
            .field("model_priority_list", &self.model_priority_list)
            .field("chat_api_key", &self.chat_api_key.as_ref().map(|_| "<redacted>"))
            .field("chat_model_priority_list", &self.chat_model_priority_list)
            .finish()
    }
}

/// Deployment status polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PollSettings::default();

        Ok(Config {
            services: ServiceConfig {
                source_control_token: require_env("GITHUB_TOKEN")?,
                hosting_token: require_env("VERCEL_TOKEN")?,
                llm_api_key: optional_env("GEMINI_API_KEY_EXTRACT")
                    .or_else(|| optional_env("GEMINI_API_KEY")),
                model_priority_list: parse_model_list(
                    &optional_env("EXTRACTOR_MODELS")
                        .unwrap_or_else(|| DEFAULT_EXTRACTOR_MODELS.to_string()),
                ),
                chat_api_key: optional_env("GEMINI_API_KEY_CHATBOT")
                    .or_else(|| optional_env("GEMINI_API_KEY")),
                chat_model_priority_list: parse_model_list(
                    &optional_env("CHATBOT_MODELS").unwrap_or_else(|| DEFAULT_CHAT_MODELS.to_string()),
                ),
            },
            github_username: require_env("GITHUB_USERNAME")?,
            vercel_team_id: optional_env("VERCEL_TEAM_ID"),
            templates_dir: optional_env("TEMPLATES_DIR")
                .unwrap_or_else(|| "templates".to_string())
                .into(),
            uploads_root: optional_env("UPLOADS_ROOT")
                .unwrap_or_else(|| ".".to_string())
                .into(),
            work_dir: optional_env("WORK_DIR")
                .unwrap_or_else(|| "temp-repos".to_string())
                .into(),
            poll: PollSettings {
                interval: match optional_env("DEPLOY_POLL_INTERVAL_SECS") {
                    Some(v) => Duration::from_secs(
                        v.parse::<u64>()
                            .context("DEPLOY_POLL_INTERVAL_SECS must be a whole number of seconds")?,
                    ),
                    None => defaults.interval,
                },
                max_attempts: match optional_env("DEPLOY_POLL_MAX_ATTEMPTS") {
                    Some(v) => v
                        .parse::<u32>()
                        .context("DEPLOY_POLL_MAX_ATTEMPTS must be a positive integer")?
                        .max(1),
                    None => defaults.max_attempts,
                },
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable's value, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated model list, dropping blanks and duplicates while
/// keeping the first occurrence's position.
fn parse_model_list(raw: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for model in raw.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        if !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }
    models
}
