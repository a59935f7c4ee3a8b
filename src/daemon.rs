//! The Parley daemon
//!
//! Wires the capability adapters together, serves the boundary HTTP API,
//! and runs the interactive voice loop: Enter toggles recording, `reset`
//! clears the conversation, `quit` exits. The voice loop runs on the main
//! task because cpal streams are not `Send`.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::{self, ApiState};
use crate::config::{Config, SttBackend, TtsBackend};
use crate::conversation::Role;
use crate::llm::ChatResponder;
use crate::pipeline::{Pipeline, Responder, Speaker, Transcriber};
use crate::speech::VoiceSpeaker;
use crate::voice::{
    AudioSegment, CpalRecorder, RecordingSession, SessionState, SpeechToText, Synthesizer,
    TextToSpeech,
};
use crate::{Error, Result};

/// How often the voice loop polls the session for device faults
const FAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The Parley daemon - serves the HTTP API and drives the voice loop
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from loaded configuration
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the configured speech-to-text adapter
    ///
    /// # Errors
    ///
    /// Returns error if the required API key is missing.
    pub fn build_transcriber(config: &Config) -> Result<Arc<dyn Transcriber>> {
        Ok(match config.voice.stt_backend {
            SttBackend::Whisper => Arc::new(SpeechToText::new_whisper(
                require_key(config.api_keys.openai.as_ref(), "OPENAI_API_KEY")?,
                config.voice.stt_model.clone(),
            )?),
            SttBackend::Deepgram => Arc::new(SpeechToText::new_deepgram(
                require_key(config.api_keys.deepgram.as_ref(), "DEEPGRAM_API_KEY")?,
                config.voice.stt_model.clone(),
            )?),
        })
    }

    /// Build the chat responder
    ///
    /// # Errors
    ///
    /// Returns error if the OpenAI API key is missing.
    pub fn build_responder(config: &Config) -> Result<Arc<dyn Responder>> {
        Ok(Arc::new(ChatResponder::new(
            require_key(config.api_keys.openai.as_ref(), "OPENAI_API_KEY")?,
            config.llm.model.clone(),
            config.llm.max_tokens,
            config.llm.system_prompt.clone(),
        )?))
    }

    /// Build the configured text-to-speech adapter
    ///
    /// # Errors
    ///
    /// Returns error if the required API key is missing.
    pub fn build_synthesizer(config: &Config) -> Result<Arc<dyn Synthesizer>> {
        Ok(match config.voice.tts_backend {
            TtsBackend::OpenAi => Arc::new(TextToSpeech::new_openai(
                require_key(config.api_keys.openai.as_ref(), "OPENAI_API_KEY")?,
                config.voice.tts_model.clone(),
                config.voice.tts_voice.clone(),
                config.voice.tts_speed,
            )?),
            TtsBackend::ElevenLabs => Arc::new(TextToSpeech::new_elevenlabs(
                require_key(config.api_keys.elevenlabs.as_ref(), "ELEVENLABS_API_KEY")?,
                config.voice.tts_model.clone(),
                config.voice.tts_voice.clone(),
            )?),
        })
    }

    /// Run the daemon until the user quits or the server stops
    ///
    /// # Errors
    ///
    /// Returns error if the adapters cannot be built or the API server
    /// cannot bind.
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        let transcriber = Self::build_transcriber(&self.config)?;
        let responder = Self::build_responder(&self.config)?;
        let synthesizer = Self::build_synthesizer(&self.config)?;

        let state = Arc::new(ApiState::new(
            Arc::clone(&transcriber),
            Arc::clone(&responder),
            Arc::clone(&synthesizer),
        ));
        let server = api::serve(api::router(state), self.config.server.port);

        if !self.config.voice.enabled {
            tracing::info!("voice disabled - serving HTTP API only");
            return server.await;
        }

        let speaker: Arc<dyn Speaker> = Arc::new(VoiceSpeaker::new(synthesizer));
        let mut pipeline = Pipeline::new(transcriber, responder, speaker);

        tokio::select! {
            res = server => res,
            res = Self::voice_loop(&mut pipeline) => res,
        }
    }

    /// Interactive recording loop on the local microphone
    #[allow(clippy::future_not_send)]
    async fn voice_loop(pipeline: &mut Pipeline) -> Result<()> {
        let (mut session, mut segments) = RecordingSession::new(CpalRecorder::new());

        if !session.initialize() {
            let reason = session.error().unwrap_or("unknown").to_string();
            tracing::error!(error = %reason, "microphone unavailable; voice loop disabled");
            eprintln!("Microphone unavailable: {reason}");
            // Keep the daemon alive for HTTP clients
            futures::future::pending::<()>().await;
        }

        println!("Press Enter to start/stop recording, type 'reset' to clear the conversation, 'quit' to exit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut fault_tick = tokio::time::interval(FAULT_POLL_INTERVAL);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match line.trim() {
                        "" => Self::toggle_recording(&mut session, pipeline),
                        "reset" => {
                            pipeline.reset();
                            println!("Conversation reset.");
                        }
                        "quit" | "exit" => break,
                        other => println!("Unknown command: {other}"),
                    }
                }
                Some(segment) = segments.recv() => {
                    Self::handle_segment(pipeline, segment).await;
                }
                _ = fault_tick.tick() => {
                    if session.check_fault() {
                        if let Some(err) = session.error() {
                            eprintln!("Recording error: {err}");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Toggle recording, honoring the no-start-while-processing gate
    fn toggle_recording<R: crate::voice::Recorder>(
        session: &mut RecordingSession<R>,
        pipeline: &Pipeline,
    ) {
        if pipeline.is_processing() {
            println!("Still processing the last recording...");
            return;
        }

        if session.state() == SessionState::Recording {
            if session.stop() {
                println!("Processing...");
            }
            if let Some(err) = session.error() {
                eprintln!("Error: {err}");
            }
        } else if session.start() {
            println!("Recording... press Enter to stop.");
        } else if let Some(err) = session.error() {
            eprintln!("Could not start recording: {err}");
        } else {
            eprintln!("Could not start recording.");
        }
    }

    /// Run one pipeline cycle and print the exchange
    async fn handle_segment(pipeline: &mut Pipeline, segment: AudioSegment) {
        match pipeline.run_cycle(segment).await {
            Ok(()) => {
                let turns = pipeline.conversation().all();
                for turn in turns.iter().rev().take(2).rev() {
                    let who = match turn.role {
                        Role::User => "You",
                        Role::Assistant => "Assistant",
                    };
                    println!("{who}: {}", turn.content);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "cycle failed");
                eprintln!("Error processing audio: {e}");
            }
        }
    }
}

/// Require a configured API key, naming the missing variable
fn require_key(key: Option<&String>, name: &str) -> Result<String> {
    key.cloned()
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}
