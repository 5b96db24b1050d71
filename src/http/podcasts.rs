//! Podcast job handlers: create, poll, download.

use crate::error::{Result, VocastError};
use crate::http::AppState;
use crate::http::voices::next_field;
use crate::job::{JobSpec, JobView};
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use uuid::Uuid;

/// Largest accepted background-music upload.
const MAX_BGM_FILE_BYTES: usize = 100 * 1024 * 1024;

#[derive(Serialize)]
pub struct JobCreated {
    pub id: String,
    pub status: crate::job::JobStatus,
}

/// POST /api/podcasts — validate, create the job, dispatch its run, and
/// answer 202 immediately with the pending status.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut script: Option<String> = None;
    let mut voice_id: Option<String> = None;
    let mut style_instruction: Option<String> = None;
    let mut bgm_volume_raw: Option<String> = None;
    let mut bgm: Option<(Vec<u8>, String)> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("script") => script = Some(read_text(field, "script").await?),
            Some("voiceId") => voice_id = Some(read_text(field, "voiceId").await?),
            Some("styleInstruction") => {
                style_instruction = Some(read_text(field, "styleInstruction").await?);
            }
            Some("bgmVolume") => bgm_volume_raw = Some(read_text(field, "bgmVolume").await?),
            Some("bgm") => {
                let file_name = field.file_name().unwrap_or("bgm.mp3").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    VocastError::validation("bgm", format!("unreadable bgm field: {e}"))
                })?;
                bgm = Some((bytes.to_vec(), file_name));
            }
            _ => {}
        }
    }

    let script = script
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| VocastError::validation("script", "script text is required"))?;

    let voice_id = voice_id
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| VocastError::validation("voiceId", "a voice id is required"))?;

    let bgm_volume = match bgm_volume_raw.as_deref().map(str::trim) {
        None | Some("") => state.default_bgm_volume,
        Some(raw) => {
            let volume: f32 = raw.parse().map_err(|_| {
                VocastError::validation("bgmVolume", "bgm volume must be a number")
            })?;
            if !(0.0..=1.0).contains(&volume) {
                return Err(VocastError::validation(
                    "bgmVolume",
                    "bgm volume must be between 0.0 and 1.0",
                ));
            }
            volume
        }
    };

    let style_instruction = style_instruction
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    // The voice must exist before any job record is created.
    if state.voices.find_by_id(&voice_id).await?.is_none() {
        return Err(VocastError::not_found("Voice", &*voice_id));
    }

    let bgm_file = match bgm {
        Some((bytes, _)) if bytes.is_empty() => None,
        Some((bytes, file_name)) => {
            if bytes.len() > MAX_BGM_FILE_BYTES {
                return Err(VocastError::validation(
                    "bgm",
                    "bgm file exceeds the 100 MB limit",
                ));
            }
            Some(store_bgm(&state, &bytes, &file_name).await?)
        }
        None => None,
    };

    let (id, view) = state
        .registry
        .create(JobSpec {
            script,
            voice_id,
            style_instruction,
            bgm_file,
            bgm_volume,
        })
        .await;

    // Snapshot taken before dispatch, so the response always says pending.
    let _task = state.orchestrator.dispatch(id.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreated {
            id,
            status: view.status,
        }),
    ))
}

/// GET /api/podcasts/{id}
pub async fn status(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobView>> {
    state
        .registry
        .view(&id)
        .await
        .map(Json)
        .ok_or_else(|| VocastError::not_found("Job", &*id))
}

/// GET /api/podcasts/{id}/download — artifact bytes, gated on completion.
///
/// A job that exists but has not completed answers 409: asking too early is
/// an expected client condition, not an error.
pub async fn download(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let job = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| VocastError::not_found("Job", &*id))?;

    let output_file = {
        let job = job.read().await;
        match (job.status, job.output_file.clone()) {
            (crate::job::JobStatus::Completed, Some(file)) => file,
            _ => {
                return Err(VocastError::Conflict {
                    message: "job has not completed yet".to_string(),
                });
            }
        }
    };

    let path = state.output_dir.join(&output_file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| VocastError::Storage {
            message: format!("failed to read {}: {e}", path.display()),
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{output_file}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| VocastError::validation(name, format!("unreadable {name} field: {e}")))
}

/// Persist an uploaded bgm blob under a fresh name, keeping the client's
/// extension.
async fn store_bgm(state: &AppState, bytes: &[u8], client_name: &str) -> Result<String> {
    tokio::fs::create_dir_all(&state.bgm_dir)
        .await
        .map_err(|e| VocastError::Storage {
            message: format!("failed to create {}: {e}", state.bgm_dir.display()),
        })?;

    let extension = client_name.rsplit('.').next().unwrap_or("mp3");
    let file_name = format!("{}.{extension}", Uuid::new_v4());
    let path = state.bgm_dir.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| VocastError::Storage {
            message: format!("failed to write {}: {e}", path.display()),
        })?;

    Ok(file_name)
}
