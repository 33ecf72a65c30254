use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::document::{read_document, DocumentError, DocumentKind};
use crate::extraction::MIN_RESUME_CHARS;
use crate::models::profile::ProfileDocument;
use crate::state::AppState;

/// Multipart field carrying the uploaded resume.
pub const RESUME_FIELD: &str = "resume";

#[derive(Debug, Deserialize)]
pub struct ExtractResumeRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResumeResponse {
    pub success: bool,
    pub data: ProfileDocument,
    pub model: String,
}

fn document_rejection(e: DocumentError) -> AppError {
    AppError::Rejected {
        code: e.code(),
        message: e.to_string(),
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}

/// Text of the first `resume` field; other fields are skipped.
async fn read_upload(mut multipart: Multipart) -> Result<String, AppError> {
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            document_rejection(DocumentError::TooLarge)
        } else {
            AppError::Validation(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let kind = DocumentKind::detect(field.content_type(), field.file_name())
            .ok_or_else(|| document_rejection(DocumentError::Unsupported))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return read_document(kind, bytes).await.map_err(document_rejection);
    }

    Err(AppError::Validation("Resume file is required".to_string()))
}

/// POST /extract-resume
///
/// Takes either a JSON `{ "text": ... }` body or a multipart upload with the
/// resume file in the `resume` field.
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ExtractResumeResponse>, AppError> {
    let extractor = state.extractor.clone().ok_or(AppError::ExtractionUnavailable)?;

    let text = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        read_upload(multipart).await?
    } else {
        let Json(req) = Json::<ExtractResumeRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        req.text
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Resume text is required".to_string()));
    }
    if text.chars().count() < MIN_RESUME_CHARS {
        return Err(AppError::Validation("Resume text is too short".to_string()));
    }

    let extraction = extractor.extract(text).await.map_err(|e| {
        if e.is_quota() {
            AppError::Extraction(format!("AI quota limit reached: {e}"))
        } else {
            AppError::Extraction(e.to_string())
        }
    })?;

    Ok(Json(ExtractResumeResponse {
        success: true,
        data: extraction.profile,
        model: extraction.model,
    }))
}
