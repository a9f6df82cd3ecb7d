use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use reel_scout::core::config;
use reel_scout::features::capture::{capture_reel, max_screenshots, CaptureLoop};
use reel_scout::features::playback::FixedDuration;
use reel_scout::CaptureOutcome;

/// Capture screenshots and caption text of a short-form video post.
#[derive(Parser, Debug)]
#[command(name = "reel-scout", version, about)]
struct Cli {
    /// Post URL
    #[arg(required_unless_present = "setup")]
    url: Option<String>,

    /// Request a headless browser (overridden unless the config says `respect`)
    #[arg(long)]
    headless: bool,

    /// Seconds between screenshots
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Upper bound on capture time in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    max_duration: u64,

    /// Directory that receives `screenshots/` and `transcripts/`
    #[arg(long, default_value = ".")]
    output_root: PathBuf,

    /// Ignore the end-of-video check and capture for the whole duration
    #[arg(long)]
    full_duration: bool,

    /// Print the pre-flight checklist and exit
    #[arg(long)]
    setup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chromiumoxide=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let cfg = config::load_config();

    if cli.setup {
        let report = reel_scout::setup::check_all(&cfg);
        println!("{}", report);
        report.print_install_hints();
        if report.has_failures() {
            std::process::exit(2);
        }
        return Ok(());
    }

    let Some(url) = cli.url else {
        anyhow::bail!("a post URL is required");
    };

    let report = reel_scout::setup::check_all(&cfg);
    info!("{}", report.summarize_for_logs());
    if report.has_failures() {
        warn!("pre-flight found missing programs; run with --setup for install steps");
    }

    let settings = cfg.capture_settings(
        Duration::from_secs(cli.interval),
        Duration::from_secs(cli.max_duration),
        cli.headless,
    );
    if cli.headless && !settings.headless {
        info!("--headless ignored: capture runs a visible browser (set capture.headless_policy = \"respect\" to change)");
    }
    info!(
        "capture budget: up to {} screenshot(s)",
        max_screenshots(settings.max_duration, settings.interval)
    );

    let mut capture = CaptureLoop::new(settings, &cli.output_root);
    if cli.full_duration {
        capture = capture.with_playback_probe(FixedDuration);
    }

    let outcome = capture_reel(&capture, &url).await;

    println!("\nScraping completed!");
    match &outcome {
        CaptureOutcome::Failed(e) => println!("Error: {}", e.error),
        CaptureOutcome::Completed(report) => {
            println!("Reel ID: {}", report.reel_id);
            println!(
                "Transcript: {}",
                serde_json::to_string_pretty(&report.transcript)?
            );
            println!("Screenshots: {} saved", report.screenshots.len());
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
