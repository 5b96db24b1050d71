//! HTTP surface: voice CRUD plus the podcast job endpoints.
//!
//! Simple translation layer — all pipeline logic lives in [`crate::job`].

pub mod podcasts;
pub mod voices;

use crate::error::VocastError;
use crate::job::{JobRegistry, Orchestrator};
use crate::voice::VoiceStore;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

/// Largest accepted request body: the 100 MB bgm limit plus headroom for
/// the other multipart fields.
const MAX_BODY_BYTES: usize = 110 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub voices: Arc<VoiceStore>,
    pub registry: Arc<JobRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub bgm_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_bgm_volume: f32,
}

/// Assemble the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/voices", get(voices::list).post(voices::create))
        .route("/api/voices/{id}", delete(voices::remove))
        .route("/api/voices/{id}/file", get(voices::file))
        .route("/api/podcasts", post(podcasts::create))
        .route("/api/podcasts/{id}", get(podcasts::status))
        .route("/api/podcasts/{id}/download", get(podcasts::download))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

impl IntoResponse for VocastError {
    fn into_response(self) -> Response {
        let status = match &self {
            VocastError::Validation { .. } => StatusCode::BAD_REQUEST,
            VocastError::NotFound { .. } => StatusCode::NOT_FOUND,
            VocastError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = match &self {
            VocastError::Validation { field, message } => serde_json::json!({
                "error": message,
                "field": field,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
