//! Speech-to-text client
//!
//! Request/response adapter over an external transcription capability.
//! Supports OpenAI Whisper (default) and Deepgram. The minimum-segment-size
//! invariant is checked locally before any upstream call.

use async_trait::async_trait;

use crate::config::UPSTREAM_TIMEOUT;
use crate::pipeline::Transcriber;
use crate::voice::{AudioSegment, MIN_SEGMENT_BYTES};
use crate::{Error, Result};

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug)]
enum SttProvider {
    Whisper,
    Deepgram,
}

/// Transcribes recorded audio segments to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create an STT client using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built.
    pub fn new_whisper(api_key: String, model: String) -> Result<Self> {
        Self::new(api_key, model, SttProvider::Whisper, "OpenAI API key required for Whisper")
    }

    /// Create an STT client using Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built.
    pub fn new_deepgram(api_key: String, model: String) -> Result<Self> {
        Self::new(api_key, model, SttProvider::Deepgram, "Deepgram API key required")
    }

    fn new(api_key: String, model: String, provider: SttProvider, key_hint: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(key_hint.to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?,
            api_key,
            model,
            provider,
        })
    }

    async fn transcribe_whisper(&self, segment: &AudioSegment) -> Result<String> {
        tracing::debug!(bytes = segment.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(segment.bytes().to_vec())
                    .file_name(segment.mime().file_name())
                    .mime_str(segment.mime().as_str())
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                Error::Transcription(format!("Whisper request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Transcription(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Whisper response");
            Error::Transcription(format!("invalid Whisper response: {e}"))
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }

    async fn transcribe_deepgram(&self, segment: &AudioSegment) -> Result<String> {
        tracing::debug!(bytes = segment.len(), "starting Deepgram transcription");

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", segment.mime().as_str())
            .body(segment.bytes().to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                Error::Transcription(format!("Deepgram request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Transcription(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
            Error::Transcription(format!("invalid Deepgram response: {e}"))
        })?;

        let transcript = result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    /// Transcribe one audio segment to text
    ///
    /// Rejects undersized segments locally without contacting the upstream
    /// service.
    async fn transcribe(&self, segment: &AudioSegment) -> Result<String> {
        if !segment.is_substantial() {
            return Err(Error::Capture(format!(
                "audio segment too small ({} bytes, minimum {MIN_SEGMENT_BYTES}); \
                 record for at least a second",
                segment.len()
            )));
        }

        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(segment).await,
            SttProvider::Deepgram => self.transcribe_deepgram(segment).await,
        }
    }
}
