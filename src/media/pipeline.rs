//! Download → extract audio → transcript placeholder, one stage after another.
//!
//! Each stage returns `None` instead of failing; [`MediaPipeline::process`]
//! turns the first `None` into an `error` object and stops.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{info, warn};

use super::tools::MediaBackend;
use crate::core::identifier::{content_id_or_timestamp, extract_content_id};
use crate::core::types::{ErrorResponse, PipelineOutcome, PipelineReport};
use crate::features::capture_session::write_atomic;

pub const VIDEO_DIR: &str = "videos";
pub const AUDIO_DIR: &str = "audio";
pub const TRANSCRIPT_DIR: &str = "transcripts";

pub struct MediaPipeline<B> {
    backend: B,
    video_dir: PathBuf,
    audio_dir: PathBuf,
    transcript_dir: PathBuf,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl<B: MediaBackend> MediaPipeline<B> {
    /// Creates `videos/`, `audio/` and `transcripts/` under `base_dir`.
    pub fn new(backend: B, base_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let base = base_dir.as_ref();
        let video_dir = base.join(VIDEO_DIR);
        let audio_dir = base.join(AUDIO_DIR);
        let transcript_dir = base.join(TRANSCRIPT_DIR);
        for dir in [&video_dir, &audio_dir, &transcript_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            backend,
            video_dir,
            audio_dir,
            transcript_dir,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn transcript_dir(&self) -> &Path {
        &self.transcript_dir
    }

    pub async fn download_video(&self, url: &str) -> Option<PathBuf> {
        let id = content_id_or_timestamp(url);
        let output = self.video_dir.join(format!("{}.mp4", id));

        if let Err(e) = self.backend.download(url, &output).await {
            warn!("Error downloading video: {:#}", e);
            return None;
        }
        if !output.exists() {
            warn!("Failed to download video: {} was not written", output.display());
            return None;
        }
        info!("Video downloaded successfully: {}", output.display());
        Some(output)
    }

    pub async fn extract_audio(&self, video: &Path) -> Option<PathBuf> {
        if !video.exists() {
            warn!("Video file not found: {}", video.display());
            return None;
        }
        let output = self.audio_dir.join(format!("{}.mp3", file_stem(video)));

        if let Err(e) = self.backend.extract_audio(video, &output).await {
            warn!("Error extracting audio: {:#}", e);
            return None;
        }
        if !output.exists() {
            warn!("Failed to extract audio: {} was not written", output.display());
            return None;
        }
        info!("Audio extracted successfully: {}", output.display());
        Some(output)
    }

    /// Record that `audio` is ready for a speech-to-text pass.
    pub fn prepare_transcript(&self, audio: &Path) -> serde_json::Value {
        if !audio.exists() {
            warn!("Audio file not found: {}", audio.display());
            return json!({ "error": "Audio file not found" });
        }

        let placeholder = json!({
            "status": "ready_for_transcription",
            "audio_path": audio.to_string_lossy(),
            "message": "Audio extraction successful. Use a transcription service to convert to text.",
        });

        let path = self
            .transcript_dir
            .join(format!("{}_transcript.json", file_stem(audio)));
        let written = serde_json::to_vec_pretty(&placeholder)
            .map_err(std::io::Error::other)
            .and_then(|bytes| write_atomic(&path, &bytes));
        match written {
            Ok(()) => info!("Transcript info saved: {}", path.display()),
            Err(e) => warn!("could not write {}: {}", path.display(), e),
        }
        placeholder
    }

    pub async fn process(&self, url: &str) -> PipelineOutcome {
        let report = self.backend.preflight();
        if report.has_failures() {
            warn!("missing tools: {}", report.failures().join(", "));
            report.print_install_hints();
            return PipelineOutcome::Failed(ErrorResponse::new("Missing dependencies"));
        }

        let Some(video_path) = self.download_video(url).await else {
            return PipelineOutcome::Failed(ErrorResponse::new("Failed to download video"));
        };

        let Some(audio_path) = self.extract_audio(&video_path).await else {
            return PipelineOutcome::Failed(ErrorResponse::new("Failed to extract audio"));
        };

        let transcript = self.prepare_transcript(&audio_path);

        PipelineOutcome::Completed(PipelineReport {
            reel_id: extract_content_id(url),
            url: url.to_string(),
            video_path,
            audio_path,
            transcript,
        })
    }
}
