//! Boundary HTTP API
//!
//! Exposes the same capability adapters the daemon uses, so thin clients can
//! drive the pipeline remotely: `/transcribe`, `/respond`, `/speak` (plus
//! `/audio/{id}` for synthesized output and `/health` for liveness).
//! Failures carry an HTTP error status and an `{ "error": ... }` body.

pub mod chat;
pub mod health;
pub mod voice;

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lru::LruCache;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::Result;
use crate::pipeline::{Responder, Transcriber};
use crate::voice::Synthesizer;

/// Capacity of the synthesized-audio cache
pub const AUDIO_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Bounded in-memory cache of synthesized audio, keyed by the id in
/// `audioUrl`
///
/// Least-recently-served entries are evicted once the capacity is reached,
/// so a long-running daemon holds at most [`AUDIO_CACHE_CAPACITY`] clips.
pub type AudioCache = Arc<Mutex<LruCache<Uuid, Vec<u8>>>>;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub transcriber: Arc<dyn Transcriber>,
    pub responder: Arc<dyn Responder>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub audio_cache: AudioCache,
}

impl ApiState {
    /// Build API state around the capability adapters
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            transcriber,
            responder,
            synthesizer,
            audio_cache: Arc::new(Mutex::new(LruCache::new(AUDIO_CACHE_CAPACITY))),
        }
    }
}

/// Build the full API router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(voice::router(Arc::clone(&state)))
        .merge(chat::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on the given port until the process exits
///
/// # Errors
///
/// Returns error if the listener cannot be bound.
pub async fn serve(router: Router, port: u16) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "HTTP API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// API handler errors
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request input (empty body, undersized audio, blank text)
    BadRequest(String),
    /// An upstream capability call failed
    Upstream(String),
    /// Referenced resource does not exist
    NotFound(String),
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Capture(msg) | crate::Error::Config(msg) => Self::BadRequest(msg),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, axum::Json(ErrorResponse { error })).into_response()
    }
}
