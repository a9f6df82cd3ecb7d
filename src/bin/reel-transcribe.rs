use std::path::PathBuf;

use clap::Parser;

use reel_scout::core::config;
use reel_scout::media::{transcribe_audio, WhisperCli, WhisperModel};
use reel_scout::TranscriptionOutcome;

/// Transcribe an audio file with the local whisper CLI.
#[derive(Parser, Debug)]
#[command(name = "reel-transcribe", version, about)]
struct Cli {
    /// Audio file to transcribe
    audio_path: PathBuf,

    /// Whisper model size
    #[arg(long, value_enum, default_value_t = WhisperModel::Base)]
    model: WhisperModel,

    /// Directory that receives `<stem>_whisper_transcript.json`
    #[arg(long, default_value = "transcripts")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let cfg = config::load_config();
    let engine = WhisperCli::from_config(&cfg.media);

    let outcome = transcribe_audio(&engine, &cli.audio_path, cli.model, &cli.output_dir).await;

    match &outcome {
        TranscriptionOutcome::Failed(e) => println!("Error: {}", e.error),
        TranscriptionOutcome::Completed(t) => {
            println!("\nTranscription completed!");
            println!("Full transcript: {}", t.text);
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
