//! Voice CRUD handlers.

use crate::error::{Result, VocastError};
use crate::http::AppState;
use crate::voice::Voice;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Largest accepted voice recording.
const MAX_VOICE_FILE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Serialize)]
pub struct VoiceList {
    pub voices: Vec<Voice>,
}

/// GET /api/voices
pub async fn list(State(state): State<AppState>) -> Result<Json<VoiceList>> {
    let voices = state.voices.list().await?;
    Ok(Json(VoiceList { voices }))
}

/// POST /api/voices — register a voice from a label and a recording.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut label: Option<String> = None;
    let mut audio: Option<(Vec<u8>, String)> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("label") => {
                label = Some(field.text().await.map_err(|e| {
                    VocastError::validation("label", format!("unreadable label field: {e}"))
                })?);
            }
            Some("audio") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("audio/webm")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    VocastError::validation("audio", format!("unreadable audio field: {e}"))
                })?;
                audio = Some((bytes.to_vec(), mime_type));
            }
            _ => {}
        }
    }

    let label = label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| VocastError::validation("label", "a label is required"))?;
    if label.chars().count() > 100 {
        return Err(VocastError::validation(
            "label",
            "label must be at most 100 characters",
        ));
    }

    let (bytes, mime_type) = audio
        .filter(|(bytes, _)| !bytes.is_empty())
        .ok_or_else(|| VocastError::validation("audio", "an audio recording is required"))?;
    if bytes.len() > MAX_VOICE_FILE_BYTES {
        return Err(VocastError::validation(
            "audio",
            "audio file exceeds the 50 MB limit",
        ));
    }

    let voice = state.voices.save(&label, &bytes, &mime_type).await?;
    Ok((StatusCode::CREATED, Json(voice)))
}

/// GET /api/voices/{id}/file — serve the stored recording.
pub async fn file(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let voice = state
        .voices
        .find_by_id(&id)
        .await?
        .ok_or_else(|| VocastError::not_found("Voice", &*id))?;

    let path = state.voices.file_path(&voice);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| VocastError::Storage {
            message: format!("failed to read {}: {e}", path.display()),
        })?;

    Ok(([(header::CONTENT_TYPE, voice.mime_type.clone())], bytes).into_response())
}

/// DELETE /api/voices/{id}
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.voices.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull the next multipart field, mapping malformed bodies to a validation
/// failure instead of a 500.
pub(crate) async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| VocastError::validation("body", format!("invalid multipart body: {e}")))
}
