//! Error types for the Parley gateway

use thiserror::Error;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Parley gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone acquisition error (permission denied, no device, ...)
    #[error("microphone error: {0}")]
    Acquisition(String),

    /// Capture error (empty or undersized audio segment)
    #[error("capture error: {0}")]
    Capture(String),

    /// Generic audio device error (encoding, playback, stream faults)
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text failure (upstream rejection or empty result)
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Language-model response generation failure
    #[error("response error: {0}")]
    Response(String),

    /// Text-to-speech failure (best-effort, never fails a cycle)
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
