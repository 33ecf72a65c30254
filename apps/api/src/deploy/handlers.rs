use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::deploy::TemplateSelector;
use crate::errors::AppError;
use crate::models::profile::ProfileDocument;
use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "Portfolio Website deployed successfully!";

#[derive(Debug, Deserialize)]
pub struct GenerateDeployRequest {
    pub template: Option<TemplateSelector>,
    #[serde(default)]
    pub data: ProfileDocument,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDeployResponse {
    pub success: bool,
    pub deployment_url: String,
    pub repo_url: String,
    pub message: &'static str,
}

/// POST /generate-and-deploy
pub async fn handle_generate_and_deploy(
    State(state): State<AppState>,
    body: Result<Json<GenerateDeployRequest>, JsonRejection>,
) -> Result<Json<GenerateDeployResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let template = req
        .template
        .ok_or_else(|| AppError::Validation("Template is required".to_string()))?;

    let outcome = state.orchestrator.run(&template, &req.data).await?;

    Ok(Json(GenerateDeployResponse {
        success: true,
        deployment_url: outcome.deployment_url,
        repo_url: outcome.repo_url,
        message: SUCCESS_MESSAGE,
    }))
}
