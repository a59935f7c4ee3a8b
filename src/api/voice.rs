//! Voice API endpoints for transcription and speech synthesis

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiState};
use crate::voice::{AudioSegment, MIN_SEGMENT_BYTES, MimeType};

/// Build voice router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/speak", post(speak))
        .route("/audio/{id}", get(audio))
        .with_state(state)
}

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcription: String,
}

/// Transcribe audio to text
///
/// Accepts raw audio bytes with `Content-Type: audio/webm` (or `audio/wav`,
/// `audio/mp4`). Empty and undersized bodies are rejected before any
/// upstream call.
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TranscribeResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("no audio data received".to_string()));
    }

    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(MimeType::from_content_type)
        .unwrap_or(MimeType::Webm);

    let segment = AudioSegment::new(body.to_vec(), mime);
    if !segment.is_substantial() {
        return Err(ApiError::BadRequest(format!(
            "audio segment too small ({} bytes, minimum {MIN_SEGMENT_BYTES}); \
             record for at least a second",
            segment.len()
        )));
    }

    let transcription = state.transcriber.transcribe(&segment).await?;

    Ok(Json(TranscribeResponse { transcription }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

/// Synthesis response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakResponse {
    pub audio_url: String,
}

/// Synthesize text to speech
///
/// Returns a URL serving the synthesized MP3 from the bounded in-memory
/// cache; the least-recently-served clip is evicted once the cache is full.
async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("no text to speak".to_string()));
    }

    let audio = state.synthesizer.synthesize(&request.text).await?;

    let id = Uuid::new_v4();
    state.audio_cache.lock().await.put(id, audio);
    tracing::debug!(%id, "synthesized audio cached");

    Ok(Json(SpeakResponse {
        audio_url: format!("/audio/{id}"),
    }))
}

/// Serve cached synthesized audio (MP3)
async fn audio(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut cache = state.audio_cache.lock().await;
    let Some(bytes) = cache.get(&id) else {
        return Err(ApiError::NotFound(format!("no audio with id {id}")));
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        bytes.clone(),
    )
        .into_response())
}
