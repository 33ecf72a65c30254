//! Deployment Trigger: submits the rendered site to the hosting platform as
//! one production deployment, then tries to make the project public.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::deploy::hosting::{DeploymentFile, DeploymentHandle, HostingPlatform};
use crate::deploy::renderer::RenderedSite;
use crate::deploy::DeployError;

pub const TARGET_ENVIRONMENT: &str = "production";

#[derive(Clone)]
pub struct DeploymentTrigger {
    hosting: Arc<dyn HostingPlatform>,
}

impl DeploymentTrigger {
    pub fn new(hosting: Arc<dyn HostingPlatform>) -> Self {
        Self { hosting }
    }

    pub async fn deploy(&self, slug: &str, site: &RenderedSite) -> Result<DeploymentHandle, DeployError> {
        let files = encode_files(site);
        info!(slug, files = files.len(), "Creating hosting deployment");

        let handle = self
            .hosting
            .create_deployment(slug, files, TARGET_ENVIRONMENT)
            .await
            .map_err(|e| DeployError::DeployTrigger(e.message()))?;

        info!(
            slug,
            deployment_id = %handle.deployment_id,
            project_id = ?handle.project_id,
            "Deployment accepted"
        );

        // Best effort: a protected project still deploys, it just isn't public.
        if let Some(project_id) = &handle.project_id {
            match self.hosting.relax_access_protection(project_id).await {
                Ok(()) => info!(project_id = %project_id, "Deployment protection disabled"),
                Err(e) => warn!(
                    project_id = %project_id,
                    "Failed to disable deployment protection (non-fatal): {e}"
                ),
            }
        }

        Ok(handle)
    }
}

fn encode_files(site: &RenderedSite) -> Vec<DeploymentFile> {
    site.files()
        .iter()
        .map(|f| DeploymentFile {
            file: f.path.clone(),
            data: STANDARD.encode(&f.contents),
            encoding: "base64",
        })
        .collect()
}
