//! Speech output
//!
//! Hands finished reply text to the TTS capability and plays the result on
//! the local speakers. Synthesis happens at an await point, so an aborted
//! speech task (conversation reset) cancels an in-flight synthesis call;
//! playback that has already started runs to completion on its blocking
//! thread.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::Speaker;
use crate::voice::{AudioPlayback, Synthesizer};
use crate::{Error, Result};

/// [`Speaker`] that synthesizes via TTS and plays through the speakers
pub struct VoiceSpeaker {
    synthesizer: Arc<dyn Synthesizer>,
}

impl VoiceSpeaker {
    /// Create a speaker around a synthesizer
    #[must_use]
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Speaker for VoiceSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let audio = self.synthesizer.synthesize(text).await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");

        // cpal output streams are not Send; build and drive the stream on a
        // blocking thread.
        tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_mp3(&audio)
        })
        .await
        .map_err(|e| Error::Synthesis(format!("playback task failed: {e}")))??;

        Ok(())
    }
}
