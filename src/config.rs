//! Configuration management for the Parley gateway
//!
//! Settings come from three layers, strongest first: environment variables,
//! the optional TOML config file (`~/.config/parley/config.toml`), then
//! built-in defaults.

pub mod file;

use std::time::Duration;

use crate::{Error, Result};

/// Request timeout applied to every upstream capability call
///
/// No retry or backoff: a failed call fails the cycle and is reported to the
/// user directly.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Default HTTP API port
pub const DEFAULT_PORT: u16 = 5005;

/// Speech-to-text backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SttBackend {
    #[default]
    Whisper,
    Deepgram,
}

impl SttBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT backend: {other}"))),
        }
    }
}

/// Text-to-speech backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsBackend {
    #[default]
    OpenAi,
    ElevenLabs,
}

impl TtsBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS backend: {other}"))),
        }
    }
}

/// Parley gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Voice configuration
    pub voice: VoiceConfig,

    /// LLM configuration
    pub llm: LlmConfig,

    /// API keys for external capabilities
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub server: ServerConfig,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone capture and speaker playback
    pub enabled: bool,

    /// STT backend
    pub stt_backend: SttBackend,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_backend: TtsBackend,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier for chat completions
    pub model: String,

    /// Maximum tokens per reply
    pub max_tokens: u32,

    /// Optional system prompt prepended ahead of the conversation
    pub system_prompt: Option<String>,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper, chat completions, TTS)
    pub openai: Option<String>,

    /// Deepgram API key (optional STT)
    pub deepgram: Option<String>,

    /// ElevenLabs API key (optional TTS)
    pub elevenlabs: Option<String>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// # Errors
    ///
    /// Returns error if the config file is malformed or a backend selection
    /// is invalid.
    pub fn load(disable_voice: bool) -> Result<Self> {
        let overlay = file::ConfigFile::load()?.unwrap_or_default();

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(overlay.api_keys.openai),
            deepgram: std::env::var("DEEPGRAM_API_KEY").ok().or(overlay.api_keys.deepgram),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(overlay.api_keys.elevenlabs),
        };

        let stt_backend = match env_or(None, "PARLEY_STT_BACKEND", overlay.voice.stt_backend) {
            Some(s) => SttBackend::parse(&s)?,
            None => SttBackend::default(),
        };
        let tts_backend = match env_or(None, "PARLEY_TTS_BACKEND", overlay.voice.tts_backend) {
            Some(s) => TtsBackend::parse(&s)?,
            None => TtsBackend::default(),
        };

        let voice = VoiceConfig {
            enabled: !disable_voice && overlay.voice.enabled.unwrap_or(true),
            stt_backend,
            stt_model: env_or(Some("whisper-1"), "PARLEY_STT_MODEL", overlay.voice.stt_model)
                .unwrap_or_default(),
            tts_backend,
            tts_model: env_or(Some("tts-1"), "PARLEY_TTS_MODEL", overlay.voice.tts_model)
                .unwrap_or_default(),
            tts_voice: env_or(Some("alloy"), "PARLEY_TTS_VOICE", overlay.voice.tts_voice)
                .unwrap_or_default(),
            tts_speed: overlay.voice.tts_speed.unwrap_or(1.0),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        let llm = LlmConfig {
            model: env_or(Some("gpt-4o-mini"), "PARLEY_LLM_MODEL", overlay.llm.model)
                .unwrap_or_default(),
            max_tokens: std::env::var("PARLEY_LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(overlay.llm.max_tokens)
                .unwrap_or(1024),
            system_prompt: env_or(None, "PARLEY_SYSTEM_PROMPT", overlay.llm.system_prompt),
        };

        let server = ServerConfig {
            port: std::env::var("PARLEY_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .or(overlay.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            voice,
            llm,
            api_keys,
            server,
        })
    }
}

/// Resolve a string setting: environment, then file overlay, then default
fn env_or(default: Option<&str>, env_var: &str, overlay: Option<String>) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .or(overlay)
        .or_else(|| default.map(String::from))
}
