//! Hosting capability: create a deployment from an inline file set, read its
//! status, and relax project access protection. `VercelClient` implements it
//! against the Vercel REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const VERCEL_API_URL: &str = "https://api.vercel.com";
const CREATE_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const PATCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HostingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl HostingError {
    /// HTTP status of the failed call, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            HostingError::Http(e) => e.status().map(|s| s.as_u16()),
            HostingError::Api { status, .. } => Some(*status),
        }
    }

    /// Upstream message without the status prefix.
    pub fn message(&self) -> String {
        match self {
            HostingError::Http(e) => e.to_string(),
            HostingError::Api { message, .. } => message.clone(),
        }
    }
}

/// One inline file of a deployment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentFile {
    pub file: String,
    pub data: String,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    pub deployment_id: String,
    pub project_id: Option<String>,
}

/// Upstream `readyState`. Anything not listed is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyState {
    Queued,
    Initializing,
    Building,
    Ready,
    Error,
    Canceled,
    Other(String),
}

impl ReadyState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "QUEUED" => ReadyState::Queued,
            "INITIALIZING" => ReadyState::Initializing,
            "BUILDING" => ReadyState::Building,
            "READY" => ReadyState::Ready,
            "ERROR" => ReadyState::Error,
            "CANCELED" | "CANCELLED" => ReadyState::Canceled,
            _ => ReadyState::Other(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub state: ReadyState,
    pub url: Option<String>,
    pub alias: Vec<String>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait HostingPlatform: Send + Sync {
    async fn create_deployment(
        &self,
        name: &str,
        files: Vec<DeploymentFile>,
        target: &str,
    ) -> Result<DeploymentHandle, HostingError>;

    async fn deployment_status(&self, deployment_id: &str) -> Result<DeploymentStatus, HostingError>;

    /// Removes password and SSO gating so the deployment is publicly reachable.
    async fn relax_access_protection(&self, project_id: &str) -> Result<(), HostingError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Vercel
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VercelDeployment {
    id: String,
    project_id: Option<String>,
    ready_state: Option<String>,
    url: Option<String>,
    #[serde(default)]
    alias: Vec<String>,
    error: Option<VercelDeploymentError>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VercelDeploymentError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VercelErrorBody {
    error: VercelErrorDetail,
}

#[derive(Debug, Deserialize)]
struct VercelErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct VercelClient {
    client: Client,
    token: String,
    team_id: Option<String>,
}

impl VercelClient {
    pub fn new(token: String, team_id: Option<String>) -> Result<Self, HostingError> {
        Ok(Self {
            client: Client::builder().build()?,
            token,
            team_id,
        })
    }

    /// Adds auth and, when configured, the team scope.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.bearer_auth(&self.token);
        match &self.team_id {
            Some(team) => builder.query(&[("teamId", team)]),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, HostingError> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<VercelErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(HostingError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl HostingPlatform for VercelClient {
    async fn create_deployment(
        &self,
        name: &str,
        files: Vec<DeploymentFile>,
        target: &str,
    ) -> Result<DeploymentHandle, HostingError> {
        let body = json!({
            "name": name,
            "files": files,
            "projectSettings": { "framework": null },
            "target": target,
        });

        let deployment: VercelDeployment = self
            .send(
                self.client
                    .post(format!("{VERCEL_API_URL}/v13/deployments"))
                    .timeout(CREATE_TIMEOUT)
                    .json(&body),
            )
            .await?
            .json()
            .await?;

        Ok(DeploymentHandle {
            deployment_id: deployment.id,
            project_id: deployment.project_id,
        })
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<DeploymentStatus, HostingError> {
        let deployment: VercelDeployment = self
            .send(
                self.client
                    .get(format!("{VERCEL_API_URL}/v13/deployments/{deployment_id}"))
                    .timeout(STATUS_TIMEOUT),
            )
            .await?
            .json()
            .await?;

        Ok(deployment.into())
    }

    async fn relax_access_protection(&self, project_id: &str) -> Result<(), HostingError> {
        self.send(
            self.client
                .patch(format!("{VERCEL_API_URL}/v9/projects/{project_id}"))
                .timeout(PATCH_TIMEOUT)
                .json(&json!({ "passwordProtection": null, "ssoProtection": null })),
        )
        .await?;
        Ok(())
    }
}

impl From<VercelDeployment> for DeploymentStatus {
    fn from(d: VercelDeployment) -> Self {
        DeploymentStatus {
            state: ReadyState::parse(d.ready_state.as_deref().unwrap_or("QUEUED")),
            url: d.url.filter(|u| !u.trim().is_empty()),
            alias: d.alias,
            error_message: d
                .error
                .and_then(|e| e.message)
                .or(d.error_message)
                .filter(|m| !m.trim().is_empty()),
        }
    }
}
