pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chatbot::handlers::handle_chat;
use crate::deploy::handlers::handle_generate_and_deploy;
use crate::extraction::document::MAX_UPLOAD_BYTES;
use crate::extraction::handlers::handle_extract_resume;
use crate::state::AppState;

/// Room for multipart framing around a maximum-size upload.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/generate-and-deploy", post(handle_generate_and_deploy))
        .route(
            "/extract-resume",
            post(handle_extract_resume).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/chatbot/chat", post(handle_chat))
        .with_state(state)
}
