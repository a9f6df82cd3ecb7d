//! External media programs (`yt-dlp`, `ffmpeg`) behind one async trait.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::core::config::MediaFileConfig;
use crate::setup::{self, SetupReport};

/// The three things the pipeline needs from the outside world.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Are the programs this backend shells out to available?
    fn preflight(&self) -> SetupReport;

    /// Download the media behind `url` to `output`.
    async fn download(&self, url: &str, output: &Path) -> Result<()>;

    /// Extract the audio track of `video` into `output`.
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()>;
}

/// Runs the real programs, resolved from config, env or PATH.
#[derive(Debug, Clone)]
pub struct ToolBackend {
    media: MediaFileConfig,
}

impl ToolBackend {
    pub fn new(media: MediaFileConfig) -> Self {
        Self { media }
    }
}

impl Default for ToolBackend {
    fn default() -> Self {
        Self::new(MediaFileConfig::default())
    }
}

/// Run `program` to completion. Non-zero exit becomes an error carrying stderr.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("Failed to run {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} exited with {}: {}", program, output.status, stderr.trim());
    }
    Ok(())
}

#[async_trait]
impl MediaBackend for ToolBackend {
    fn preflight(&self) -> SetupReport {
        setup::check_media_tools(&self.media)
    }

    async fn download(&self, url: &str, output: &Path) -> Result<()> {
        info!("Downloading video from {}", url);
        run_tool(
            &self.media.resolve_yt_dlp(),
            [
                OsStr::new("--no-warnings"),
                OsStr::new("-o"),
                output.as_os_str(),
                OsStr::new(url),
            ],
        )
        .await
    }

    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()> {
        info!("Extracting audio from {}", video.display());
        run_tool(
            &self.media.resolve_ffmpeg(),
            [
                OsStr::new("-i"),
                video.as_os_str(),
                OsStr::new("-q:a"),
                OsStr::new("0"),
                OsStr::new("-map"),
                OsStr::new("a"),
                OsStr::new("-y"),
                output.as_os_str(),
            ],
        )
        .await
    }
}
