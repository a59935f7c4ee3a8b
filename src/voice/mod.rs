//! Voice processing module
//!
//! Audio capture, the recording session state machine, STT/TTS clients, and
//! speaker playback.

mod capture;
mod playback;
mod session;
mod stt;
mod tts;

pub use capture::{
    AudioSegment, CpalRecorder, MIN_SEGMENT_BYTES, MimeType, Recorder, SAMPLE_RATE, samples_to_wav,
};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE};
pub use session::{RecordingSession, SessionState};
pub use stt::SpeechToText;
pub use tts::{Synthesizer, TextToSpeech};
