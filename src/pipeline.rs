//! Conversation pipeline orchestration
//!
//! Drives one full cycle per completed recording: validate the segment,
//! transcribe it, append the user turn, generate the assistant reply from
//! the full conversation so far, append it, then hand the reply to speech
//! output. One cycle runs at a time; the orchestrator always returns to
//! `Idle`, whether the cycle succeeded or failed at any step.
//!
//! Failure policy: a failing step aborts the cycle and leaves the
//! conversation in whatever partially-advanced state it reached. There is
//! no rollback of already-appended turns.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::conversation::{ConversationStore, Turn};
use crate::voice::AudioSegment;
use crate::{Error, Result};

/// Speech-to-text capability consumed by the pipeline
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio segment to text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] for undersized segments (checked locally)
    /// and [`Error::Transcription`] for upstream failures.
    async fn transcribe(&self, segment: &AudioSegment) -> Result<String>;
}

/// Language-model capability consumed by the pipeline
///
/// The upstream service is stateless per call; the supplied turn order
/// (oldest first) is its only context.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Generate the assistant reply for the conversation so far
    ///
    /// # Errors
    ///
    /// Returns [`Error::Response`] when generation fails upstream.
    async fn respond(&self, turns: &[Turn]) -> Result<String>;
}

/// Speech output capability consumed by the pipeline (best-effort)
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak the reply text aloud
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] on failure; the pipeline only logs it.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Orchestrator cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No cycle in flight
    Idle,
    /// A capture→transcribe→respond→speak cycle is running
    Processing,
}

/// Sequences one conversation cycle at a time
///
/// Owns the conversation store and the `Idle`/`Processing` state. Callers
/// gate recording at the UI level while `Processing`; `run_cycle` refuses a
/// concurrent cycle anyway rather than corrupting state.
pub struct Pipeline {
    state: PipelineState,
    conversation: ConversationStore,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    speaker: Arc<dyn Speaker>,
    speech_task: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Create an idle pipeline with an empty conversation
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        speaker: Arc<dyn Speaker>,
    ) -> Self {
        Self {
            state: PipelineState::Idle,
            conversation: ConversationStore::new(),
            transcriber,
            responder,
            speaker,
            speech_task: None,
        }
    }

    /// Run one full cycle for a completed recording
    ///
    /// Always restores `Idle` before returning, regardless of which step
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; the conversation keeps any
    /// turns appended before that step.
    pub async fn run_cycle(&mut self, segment: AudioSegment) -> Result<()> {
        if self.state == PipelineState::Processing {
            tracing::warn!("cycle refused: another cycle is in flight");
            return Err(Error::Capture("a cycle is already in progress".to_string()));
        }

        self.state = PipelineState::Processing;
        let result = self.cycle(segment).await;
        self.state = PipelineState::Idle;
        result
    }

    async fn cycle(&mut self, segment: AudioSegment) -> Result<()> {
        if segment.is_empty() {
            return Err(Error::Capture("no audio data recorded".to_string()));
        }
        if !segment.is_substantial() {
            return Err(Error::Capture(format!(
                "audio segment too small ({} bytes, minimum {}); record for at least a second",
                segment.len(),
                crate::voice::MIN_SEGMENT_BYTES
            )));
        }

        tracing::debug!(bytes = segment.len(), mime = segment.mime().as_str(), "cycle started");

        let text = self.transcriber.transcribe(&segment).await?;
        if text.trim().is_empty() {
            return Err(Error::Transcription(
                "empty transcription; please try speaking again".to_string(),
            ));
        }
        self.conversation.append(Turn::user(text));

        let reply = self.responder.respond(self.conversation.all()).await?;
        if reply.trim().is_empty() {
            return Err(Error::Response("empty response from model".to_string()));
        }
        self.conversation.append(Turn::assistant(reply.clone()));

        tracing::info!(turns = self.conversation.len(), "cycle complete");

        // Best-effort speech: failures are logged, never fail the cycle.
        // A newer reply supersedes speech still in flight.
        if let Some(task) = self.speech_task.take() {
            task.abort();
        }
        let speaker = Arc::clone(&self.speaker);
        self.speech_task = Some(tokio::spawn(async move {
            if let Err(e) = speaker.speak(&reply).await {
                tracing::warn!(error = %e, "speech output failed");
            }
        }));

        Ok(())
    }

    /// Clear the conversation and cancel any in-flight speech
    pub fn reset(&mut self) {
        self.conversation.reset();
        if let Some(task) = self.speech_task.take() {
            task.abort();
        }
        tracing::info!("conversation reset");
    }

    /// Current cycle state
    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Whether a cycle is currently in flight
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.state == PipelineState::Processing
    }

    /// The conversation log, oldest turn first
    #[must_use]
    pub const fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }
}
