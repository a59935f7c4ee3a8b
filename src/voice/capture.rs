//! Audio capture from microphone
//!
//! The pipeline consumes discrete [`AudioSegment`]s, one per completed
//! recording. Capture hardware sits behind the [`Recorder`] trait so the
//! recording session can be exercised without a microphone.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum segment size worth transcribing
///
/// Segments shorter than this are almost certainly silence or noise; both
/// the pipeline and the transcription client reject them before any
/// upstream call.
pub const MIN_SEGMENT_BYTES: usize = 500;

/// MIME tag for an audio segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Wav,
    Webm,
    Mp4,
}

impl MimeType {
    /// The `Content-Type` string for this format
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
            Self::Mp4 => "audio/mp4",
        }
    }

    /// Upload file name used when posting to STT APIs
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Wav => "recording.wav",
            Self::Webm => "recording.webm",
            Self::Mp4 => "recording.mp4",
        }
    }

    /// Parse a `Content-Type` header value, ignoring parameters
    #[must_use]
    pub fn from_content_type(value: &str) -> Option<Self> {
        match value.split(';').next().map(str::trim) {
            Some("audio/wav" | "audio/x-wav" | "audio/wave") => Some(Self::Wav),
            Some("audio/webm") => Some(Self::Webm),
            Some("audio/mp4") => Some(Self::Mp4),
            _ => None,
        }
    }
}

/// One complete recorded audio clip, ready for transcription
#[derive(Debug, Clone)]
pub struct AudioSegment {
    bytes: Vec<u8>,
    mime: MimeType,
}

impl AudioSegment {
    /// Wrap encoded audio bytes with their MIME tag
    #[must_use]
    pub const fn new(bytes: Vec<u8>, mime: MimeType) -> Self {
        Self { bytes, mime }
    }

    /// Encoded audio bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME tag of the encoded audio
    #[must_use]
    pub const fn mime(&self) -> MimeType {
        self.mime
    }

    /// Size in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the segment holds no data
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the segment meets the minimum-size threshold
    #[must_use]
    pub const fn is_substantial(&self) -> bool {
        self.bytes.len() >= MIN_SEGMENT_BYTES
    }
}

/// Microphone capability consumed by the recording session
///
/// `acquire` opens the device handle, `start`/`stop` bracket one recording,
/// and `release` gives the handle back. A device fault that occurs
/// mid-recording is reported out-of-band through `take_fault`.
pub trait Recorder {
    /// Open the microphone handle
    ///
    /// # Errors
    ///
    /// Returns [`Error::Acquisition`] if the device is missing, permission
    /// is denied, or the device cannot be configured.
    fn acquire(&mut self) -> Result<()>;

    /// Begin accumulating audio
    ///
    /// # Errors
    ///
    /// Returns error if the capture stream cannot be started.
    fn start(&mut self) -> Result<()>;

    /// Stop and flush the accumulated audio as one segment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if no audio was accumulated.
    fn stop(&mut self) -> Result<AudioSegment>;

    /// Take a pending device fault, if one occurred since the last call
    fn take_fault(&mut self) -> Option<String>;

    /// Release the microphone handle
    fn release(&mut self);
}

/// [`Recorder`] backed by the default cpal input device
///
/// Captures 16kHz mono f32 samples and flushes them as a WAV segment on
/// stop. Streams are not `Send`, so this recorder must live on the thread
/// that created it.
pub struct CpalRecorder {
    device: Option<Device>,
    config: Option<StreamConfig>,
    stream: Option<Stream>,
    buffer: Arc<Mutex<Vec<f32>>>,
    fault: Arc<Mutex<Option<String>>>,
}

impl CpalRecorder {
    /// Create a recorder with no device handle yet
    #[must_use]
    pub fn new() -> Self {
        Self {
            device: None,
            config: None,
            stream: None,
            buffer: Arc::new(Mutex::new(Vec::new())),
            fault: Arc::new(Mutex::new(None)),
        }
    }
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for CpalRecorder {
    fn acquire(&mut self) -> Result<()> {
        let host = cpal::default_host();

        let device = host.default_input_device().ok_or_else(|| {
            Error::Acquisition(
                "no microphone found; ensure a microphone is connected".to_string(),
            )
        })?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| acquisition_error(&e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| {
                Error::Acquisition("no suitable microphone configuration found".to_string())
            })?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "microphone acquired"
        );

        self.device = Some(device);
        self.config = Some(config);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| Error::Acquisition("microphone not acquired".to_string()))?;
        let config = self
            .config
            .clone()
            .ok_or_else(|| Error::Acquisition("microphone not acquired".to_string()))?;

        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let buffer = Arc::clone(&self.buffer);
        let fault = Arc::clone(&self.fault);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "audio capture error");
                    if let Ok(mut fault) = fault.lock() {
                        *fault = Some(format!("recording error: {err}"));
                    }
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioSegment> {
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }

        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        if samples.is_empty() {
            return Err(Error::Capture("no audio data recorded".to_string()));
        }

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        tracing::debug!(samples = samples.len(), bytes = wav.len(), "audio capture flushed");
        Ok(AudioSegment::new(wav, MimeType::Wav))
    }

    fn take_fault(&mut self) -> Option<String> {
        self.fault.lock().ok().and_then(|mut f| f.take())
    }

    fn release(&mut self) {
        self.stream = None;
        self.device = None;
        self.config = None;
        tracing::debug!("microphone released");
    }
}

/// Map a device failure message to an actionable acquisition error
///
/// cpal surfaces permission and enumeration failures as backend-specific
/// strings, so cause detection is by message inspection.
fn acquisition_error(detail: &str) -> Error {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not allowed") {
        Error::Acquisition(
            "microphone permission denied; allow microphone access and try again".to_string(),
        )
    } else if lower.contains("not found") || lower.contains("no device") {
        Error::Acquisition("no microphone found; ensure a microphone is connected".to_string())
    } else {
        Error::Acquisition(format!("could not access microphone: {detail}"))
    }
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_content_type() {
        assert_eq!(MimeType::from_content_type("audio/webm"), Some(MimeType::Webm));
        assert_eq!(
            MimeType::from_content_type("audio/wav; codecs=1"),
            Some(MimeType::Wav)
        );
        assert_eq!(MimeType::from_content_type("audio/mp4"), Some(MimeType::Mp4));
        assert_eq!(MimeType::from_content_type("text/plain"), None);
    }

    #[test]
    fn segment_size_threshold() {
        let small = AudioSegment::new(vec![0; 100], MimeType::Webm);
        assert!(!small.is_substantial());
        assert!(!small.is_empty());

        let large = AudioSegment::new(vec![0; 2000], MimeType::Webm);
        assert!(large.is_substantial());

        let empty = AudioSegment::new(Vec::new(), MimeType::Webm);
        assert!(empty.is_empty());
    }

    #[test]
    fn wav_encoding_produces_valid_header() {
        let samples = vec![0.0_f32; 1600];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header + 2 bytes per i16 sample
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn acquisition_error_distinguishes_causes() {
        assert!(matches!(
            acquisition_error("Access denied by user"),
            Error::Acquisition(msg) if msg.contains("permission denied")
        ));
        assert!(matches!(
            acquisition_error("device not found"),
            Error::Acquisition(msg) if msg.contains("no microphone found")
        ));
        assert!(matches!(
            acquisition_error("backend exploded"),
            Error::Acquisition(msg) if msg.contains("could not access microphone")
        ));
    }
}
