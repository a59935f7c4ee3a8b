//! Shared test doubles
//!
//! Capability mocks for driving the pipeline, session, and API routes
//! without hardware or network access.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_gateway::pipeline::{Responder, Speaker, Transcriber};
use parley_gateway::voice::{AudioSegment, MimeType, Recorder, Synthesizer};
use parley_gateway::{Error, Result, Turn};

/// Build a segment of the given size
pub fn segment(len: usize) -> AudioSegment {
    AudioSegment::new(vec![0_u8; len], MimeType::Webm)
}

/// Scripted transcriber
pub struct MockTranscriber {
    text: std::result::Result<String, String>,
    pub calls: AtomicUsize,
}

impl MockTranscriber {
    pub fn text(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _segment: &AudioSegment) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.text {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(Error::Transcription(msg.clone())),
        }
    }
}

/// Scripted responder recording the turn sequences it was given
pub struct MockResponder {
    reply: std::result::Result<String, String>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<Turn>>>,
}

impl MockResponder {
    pub fn reply(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Turns passed to the most recent call
    pub fn last_seen(&self) -> Vec<Turn> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(turns.to_vec());
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(msg) => Err(Error::Response(msg.clone())),
        }
    }
}

/// Speaker double recording what it was asked to say
pub struct MockSpeaker {
    pub spoken: Mutex<Vec<String>>,
    pub completions: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
}

impl MockSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
            delay: None,
            fail: false,
        })
    }

    /// A speaker whose synthesis never finishes (for cancellation tests)
    pub fn hanging() -> Arc<Self> {
        Self::slow(Duration::from_secs(60))
    }

    /// A speaker whose synthesis takes the given time to finish
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
            delay: Some(delay),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
            delay: None,
            fail: true,
        })
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// How many speak calls ran to completion
    pub fn completed_count(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn is_completed(&self) -> bool {
        self.completed_count() > 0
    }
}

#[async_trait]
impl Speaker for MockSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(Error::Synthesis("speaker unavailable".to_string()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Synthesizer double returning fixed MP3-shaped bytes
pub struct MockSynthesizer {
    audio: std::result::Result<Vec<u8>, String>,
    pub calls: AtomicUsize,
}

impl MockSynthesizer {
    pub fn audio(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            audio: Ok(bytes.to_vec()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            audio: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.audio {
            Ok(bytes) => Ok(bytes.clone()),
            Err(msg) => Err(Error::Synthesis(msg.clone())),
        }
    }
}

/// Scripted recorder for session tests
///
/// Shared handles let a test observe stop/release counts after the recorder
/// has moved into the session.
pub struct MockRecorder {
    pub fail_acquire: Option<String>,
    pub segments: Arc<Mutex<VecDeque<AudioSegment>>>,
    pub fault: Arc<Mutex<Option<String>>>,
    pub stops: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self {
            fail_acquire: None,
            segments: Arc::new(Mutex::new(VecDeque::new())),
            fault: Arc::new(Mutex::new(None)),
            stops: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_acquire(message: &str) -> Self {
        Self {
            fail_acquire: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Queue a segment to be returned by the next stop
    pub fn queue_segment(&self, seg: AudioSegment) {
        self.segments.lock().unwrap().push_back(seg);
    }

    /// Inject a device fault to be picked up by the next poll
    pub fn inject_fault(fault: &Arc<Mutex<Option<String>>>, message: &str) {
        *fault.lock().unwrap() = Some(message.to_string());
    }
}

impl Recorder for MockRecorder {
    fn acquire(&mut self) -> Result<()> {
        match &self.fail_acquire {
            Some(msg) => Err(Error::Acquisition(msg.clone())),
            None => Ok(()),
        }
    }

    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioSegment> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.segments
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Capture("no audio data recorded".to_string()))
    }

    fn take_fault(&mut self) -> Option<String> {
        self.fault.lock().unwrap().take()
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
