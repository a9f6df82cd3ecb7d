use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::identifier::ContentIdentifier;

pub const CAPTION_CHANNEL: &str = "caption";
pub const CLOSED_CAPTIONS_CHANNEL: &str = "closed_captions";

/// Text found on the page, keyed by extraction channel.
///
/// A key is present only when the channel produced non-blank text; values
/// are stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TranscriptRecord(BTreeMap<String, String>);

impl TranscriptRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` under `channel` if it is non-blank after trimming.
    /// Returns whether the value was kept.
    pub fn insert(&mut self, channel: impl Into<String>, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.0.insert(channel.into(), trimmed.to_string());
        true
    }

    pub fn get(&self, channel: &str) -> Option<&str> {
        self.0.get(channel).map(String::as_str)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.0.contains_key(channel)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// Every entry goes through `insert`, so a loaded record obeys the same rules.
impl<'de> Deserialize<'de> for TranscriptRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut record = TranscriptRecord::new();
        for (channel, text) in raw {
            record.insert(channel, &text);
        }
        Ok(record)
    }
}

/// Error object shared by every entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Everything a finished capture session produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReport {
    pub reel_id: ContentIdentifier,
    pub url: String,
    pub transcript: TranscriptRecord,
    /// Screenshot files in capture order.
    pub screenshots: Vec<PathBuf>,
    /// Whether a primary media element was found before capturing.
    pub video_found: bool,
    /// Why the capture loop stopped.
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Wall-clock budget exhausted.
    DurationElapsed,
    /// Playback predicate reported the media as ended or paused.
    PlaybackEnded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureOutcome {
    Completed(CaptureReport),
    Failed(ErrorResponse),
}

impl CaptureOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, CaptureOutcome::Failed(_))
    }
}

/// Result of the download → extract-audio → transcript pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub reel_id: Option<ContentIdentifier>,
    pub url: String,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub transcript: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineOutcome {
    Completed(PipelineReport),
    Failed(ErrorResponse),
}

impl PipelineOutcome {
    pub fn error(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Failed(e) => Some(e.error.as_str()),
            PipelineOutcome::Completed(_) => None,
        }
    }
}

/// Speech-to-text output as persisted to `<stem>_whisper_transcript.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechTranscript {
    pub text: String,
    pub segments: Vec<serde_json::Value>,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptionOutcome {
    Completed(SpeechTranscript),
    Failed(ErrorResponse),
}
