use std::path::PathBuf;

use clap::Parser;

use reel_scout::core::config;
use reel_scout::media::{MediaPipeline, ToolBackend};
use reel_scout::PipelineOutcome;

/// Download a post's video, extract its audio and stage it for transcription.
#[derive(Parser, Debug)]
#[command(name = "reel-media", version, about)]
struct Cli {
    /// Post URL
    url: String,

    /// Directory that receives `videos/`, `audio/` and `transcripts/`
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let cfg = config::load_config();

    let pipeline = MediaPipeline::new(ToolBackend::new(cfg.media), &cli.base_dir)?;
    let outcome = pipeline.process(&cli.url).await;

    println!("\nProcessing completed!");
    match &outcome {
        PipelineOutcome::Failed(e) => println!("Error: {}", e.error),
        PipelineOutcome::Completed(report) => {
            match &report.reel_id {
                Some(id) => println!("Reel ID: {}", id),
                None => println!("Reel ID: (none)"),
            }
            println!("Video saved: {}", report.video_path.display());
            println!("Audio saved: {}", report.audio_path.display());
            println!(
                "Transcript info: {}",
                serde_json::to_string_pretty(&report.transcript)?
            );
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
