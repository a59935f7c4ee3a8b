//! Recording session state machine
//!
//! Gates start/stop of a [`Recorder`] and exposes initialization and error
//! status. `start()`/`stop()` are synchronous commands returning a success
//! flag; the flushed audio arrives later on the segment channel, one
//! [`AudioSegment`] per completed recording. Callers must not assume audio
//! is available when `stop()` returns `true`.

use tokio::sync::mpsc;

use super::capture::{AudioSegment, Recorder};

/// Recording session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No microphone handle yet
    Uninitialized,
    /// Microphone acquired, not recording
    Ready,
    /// Actively accumulating audio
    Recording,
}

/// State machine owning one microphone handle
///
/// The error flag is orthogonal to the state and clearable independently of
/// transitions. On disposal the session stops any active recording and
/// releases the microphone handle exactly once.
pub struct RecordingSession<R: Recorder> {
    recorder: R,
    state: SessionState,
    error: Option<String>,
    segments: mpsc::UnboundedSender<AudioSegment>,
}

impl<R: Recorder> RecordingSession<R> {
    /// Create a session around a recorder, without acquiring the microphone
    ///
    /// Returns the session and the receiving end of the segment channel.
    #[must_use]
    pub fn new(recorder: R) -> (Self, mpsc::UnboundedReceiver<AudioSegment>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                recorder,
                state: SessionState::Uninitialized,
                error: None,
                segments: tx,
            },
            rx,
        )
    }

    /// Acquire the microphone handle: `Uninitialized → Ready`
    ///
    /// On failure the state stays `Uninitialized` and the error flag holds a
    /// descriptive message (permission denied, device missing, or generic).
    pub fn initialize(&mut self) -> bool {
        if self.state != SessionState::Uninitialized {
            return true;
        }

        match self.recorder.acquire() {
            Ok(()) => {
                self.state = SessionState::Ready;
                tracing::debug!("recording session initialized");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "microphone acquisition failed");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Begin a recording: `Ready → Recording`
    ///
    /// Rejected (returns `false`, no transition) unless currently `Ready`.
    /// A successful start clears the error flag.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Ready {
            tracing::warn!(state = ?self.state, "cannot start recording");
            return false;
        }

        match self.recorder.start() {
            Ok(()) => {
                self.error = None;
                self.state = SessionState::Recording;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start recording");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// End the recording: `Recording → Ready`
    ///
    /// Rejected (returns `false`) unless currently `Recording`. On success
    /// the accumulated audio is flushed as one segment onto the channel; a
    /// zero-size flush delivers nothing and sets the error flag instead.
    pub fn stop(&mut self) -> bool {
        if self.state != SessionState::Recording {
            tracing::warn!(state = ?self.state, "cannot stop recording");
            return false;
        }

        self.state = SessionState::Ready;

        match self.recorder.stop() {
            Ok(segment) => {
                if self.segments.send(segment).is_err() {
                    tracing::warn!("segment receiver dropped, discarding audio");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "recording flush failed");
                self.error = Some(e.to_string());
            }
        }

        true
    }

    /// Poll for a device fault raised since the last check
    ///
    /// A fault sets the error flag and, if a recording was active, forces an
    /// implicit `Recording → Ready` transition so the session is never stuck
    /// reporting a recording after a hardware failure. Returns `true` if a
    /// fault was observed.
    pub fn check_fault(&mut self) -> bool {
        let Some(fault) = self.recorder.take_fault() else {
            return false;
        };

        tracing::error!(fault = %fault, "device fault during session");
        self.error = Some(fault);

        if self.state == SessionState::Recording {
            // Discard whatever was accumulated; the stream is already dead.
            let _ = self.recorder.stop();
            self.state = SessionState::Ready;
        }

        true
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the microphone has been acquired
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state != SessionState::Uninitialized
    }

    /// Current error message, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear the error flag without touching the state
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl<R: Recorder> Drop for RecordingSession<R> {
    fn drop(&mut self) {
        if self.state == SessionState::Recording {
            let _ = self.recorder.stop();
        }
        self.recorder.release();
    }
}
