//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay underneath
//! environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable microphone capture and playback
    pub enabled: Option<bool>,

    /// STT backend ("whisper" or "deepgram")
    pub stt_backend: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS backend ("openai" or "elevenlabs")
    pub tts_backend: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Maximum tokens per reply
    pub max_tokens: Option<u32>,

    /// System prompt prepended ahead of the conversation
    pub system_prompt: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP API port
    pub port: Option<u16>,
}

impl ConfigFile {
    /// Load the config file if one exists
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Option<Self>> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let parsed = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Some(parsed))
    }
}

/// Path of the user config file (`~/.config/parley/config.toml` on Linux)
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "parley", "parley")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_overlay() {
        let file: ConfigFile = toml::from_str(
            r#"
            [voice]
            tts_voice = "nova"
            tts_speed = 1.2

            [llm]
            model = "gpt-4o"

            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(file.voice.tts_voice.as_deref(), Some("nova"));
        assert_eq!(file.voice.tts_speed, Some(1.2));
        assert!(file.voice.stt_model.is_none());
        assert_eq!(file.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(file.server.port, Some(8080));
        assert!(file.api_keys.openai.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.voice.enabled.is_none());
        assert!(file.llm.model.is_none());
        assert!(file.server.port.is_none());
    }
}
