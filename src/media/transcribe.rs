//! Speech-to-text for extracted audio, backed by the local `whisper` CLI.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};

use crate::core::config::MediaFileConfig;
use crate::core::types::{ErrorResponse, SpeechTranscript, TranscriptionOutcome};
use crate::features::capture_session::write_atomic;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    pub fn as_str(self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn transcribe(&self, audio: &Path, model: WhisperModel) -> Result<SpeechTranscript>;
}

/// Whisper's `--output_format json` document.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    segments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct WhisperCli {
    program: String,
}

impl WhisperCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(media: &MediaFileConfig) -> Self {
        Self::new(media.resolve_whisper())
    }
}

#[async_trait]
impl SpeechEngine for WhisperCli {
    async fn transcribe(&self, audio: &Path, model: WhisperModel) -> Result<SpeechTranscript> {
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;

        let output = Command::new(&self.program)
            .arg(audio)
            .arg("--model")
            .arg(model.as_str())
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run whisper")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Whisper failed: {}", stderr.trim());
        }

        let stem = audio.file_stem().unwrap_or_default().to_string_lossy();
        let json_path = temp_dir.path().join(format!("{}.json", stem));
        let raw = tokio::fs::read_to_string(&json_path)
            .await
            .context("Failed to read whisper output")?;
        let parsed: WhisperOutput =
            serde_json::from_str(&raw).context("Failed to parse whisper JSON")?;

        Ok(SpeechTranscript {
            text: parsed.text.trim().to_string(),
            segments: parsed.segments,
            language: parsed.language,
        })
    }
}

/// Transcribe `audio` and save `<output_dir>/<stem>_whisper_transcript.json`.
pub async fn transcribe_audio(
    engine: &dyn SpeechEngine,
    audio: &Path,
    model: WhisperModel,
    output_dir: &Path,
) -> TranscriptionOutcome {
    if !audio.exists() {
        warn!("Audio file not found: {}", audio.display());
        return TranscriptionOutcome::Failed(ErrorResponse::new("Audio file not found"));
    }

    match run(engine, audio, model, output_dir).await {
        Ok(transcript) => TranscriptionOutcome::Completed(transcript),
        Err(e) => {
            warn!("Error transcribing audio: {:#}", e);
            TranscriptionOutcome::Failed(ErrorResponse::new(format!("{:#}", e)))
        }
    }
}

async fn run(
    engine: &dyn SpeechEngine,
    audio: &Path,
    model: WhisperModel,
    output_dir: &Path,
) -> Result<SpeechTranscript> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    info!("Transcribing {} with whisper model {}", audio.display(), model);
    let transcript = engine.transcribe(audio, model).await?;

    let stem = audio.file_stem().unwrap_or_default().to_string_lossy();
    let path = output_dir.join(format!("{}_whisper_transcript.json", stem));
    let bytes = serde_json::to_vec_pretty(&transcript)?;
    write_atomic(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Transcript saved: {}", path.display());

    Ok(transcript)
}
