//! Parley Gateway - Voice conversation gateway for AI assistants
//!
//! This library provides the core functionality for the Parley gateway:
//! - Recording session state machine over microphone capture
//! - The conversation pipeline (capture → transcribe → respond → speak)
//! - STT / LLM / TTS capability adapters
//! - The boundary HTTP API for thin clients
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Interfaces                        │
//! │     Console voice loop   │   HTTP API clients       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Parley Gateway                       │
//! │  RecordingSession │ Pipeline │ ConversationStore    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │            External capabilities                    │
//! │    STT (Whisper/Deepgram) │ LLM │ TTS               │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod daemon;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod speech;
pub mod voice;

pub use config::Config;
pub use conversation::{ConversationStore, Role, Turn};
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineState, Responder, Speaker, Transcriber};
