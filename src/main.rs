use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley_gateway::pipeline::Speaker;
use parley_gateway::speech::VoiceSpeaker;
use parley_gateway::voice::{AudioPlayback, CpalRecorder, PLAYBACK_SAMPLE_RATE, Recorder};
use parley_gateway::{Config, Daemon};

/// Parley - Voice conversation gateway for AI assistants
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Port for the HTTP API (overrides config)
    #[arg(long, env = "PARLEY_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for headless servers without audio hardware)
    #[arg(long, env = "PARLEY_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley_gateway=info",
        1 => "info,parley_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&text).await,
        };
    }

    let mut config = Config::load(cli.disable_voice)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!(
        port = config.server.port,
        voice = config.voice.enabled,
        "starting parley gateway"
    );

    Daemon::new(config).run().await?;
    Ok(())
}

/// Record from the default microphone and report the captured segment
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    let mut recorder = CpalRecorder::new();
    recorder.acquire()?;
    recorder.start()?;
    println!("Recording for {duration} seconds...");

    tokio::time::sleep(Duration::from_secs(duration)).await;

    let segment = recorder.stop()?;
    recorder.release();
    println!(
        "Captured {} bytes of {}",
        segment.len(),
        segment.mime().as_str()
    );
    Ok(())
}

/// Play a short tone through the default output device
async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing test tone...");

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..PLAYBACK_SAMPLE_RATE)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            0.2 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();

    tokio::task::spawn_blocking(move || {
        let playback = AudioPlayback::new()?;
        playback.play_samples(samples)
    })
    .await??;

    println!("Done.");
    Ok(())
}

/// Synthesize text with the configured TTS backend and speak it
async fn test_tts(text: &str) -> anyhow::Result<()> {
    let config = Config::load(false)?;
    let synthesizer = Daemon::build_synthesizer(&config)?;
    let speaker = VoiceSpeaker::new(synthesizer);

    println!("Speaking: {text}");
    speaker.speak(text).await?;
    Ok(())
}
