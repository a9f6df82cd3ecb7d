//! On-disk artifacts of one capture run.
//!
//! Layout under the output root:
//! ```text
//! screenshots/<id>/initial_page.png
//! screenshots/<id>/screenshot_000.png, screenshot_001.png, ...
//! transcripts/<id>_transcript.json
//! ```
//! Every file is written to a temp file in the same directory and renamed
//! into place, so an interrupted write never leaves a truncated artifact.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::identifier::ContentIdentifier;
use crate::core::types::TranscriptRecord;

pub const SCREENSHOT_DIR: &str = "screenshots";
pub const TRANSCRIPT_DIR: &str = "transcripts";

/// Write `bytes` to `path` via a sibling temp file and an atomic rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn screenshot_file_name(seq: usize) -> String {
    format!("screenshot_{:03}.png", seq)
}

pub fn transcript_path(root: &Path, id: &ContentIdentifier) -> PathBuf {
    root.join(TRANSCRIPT_DIR)
        .join(format!("{}_transcript.json", id))
}

/// Screenshots of one run, in capture order.
#[derive(Debug)]
pub struct CaptureSession {
    id: ContentIdentifier,
    root: PathBuf,
    dir: PathBuf,
    screenshots: Vec<PathBuf>,
}

impl CaptureSession {
    /// Create `screenshots/<id>/` under `root`.
    pub fn create(root: &Path, id: ContentIdentifier) -> std::io::Result<Self> {
        let dir = root.join(SCREENSHOT_DIR).join(id.as_str());
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            id,
            root: root.to_path_buf(),
            dir,
            screenshots: Vec::new(),
        })
    }

    pub fn id(&self) -> &ContentIdentifier {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn screenshots(&self) -> &[PathBuf] {
        &self.screenshots
    }

    /// Sequence number the next screenshot will get.
    pub fn next_seq(&self) -> usize {
        self.screenshots.len()
    }

    /// Persist the next numbered screenshot.
    pub fn save_screenshot(&mut self, png: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.join(screenshot_file_name(self.next_seq()));
        write_atomic(&path, png)?;
        info!("Screenshot saved: {}", path.display());
        self.screenshots.push(path.clone());
        Ok(path)
    }

    /// Persist an unnumbered image such as the post-load overview.
    pub fn save_named(&self, file_name: &str, png: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.join(file_name);
        write_atomic(&path, png)?;
        Ok(path)
    }

    /// Persist the transcript record as pretty JSON.
    pub fn save_transcript(&self, record: &TranscriptRecord) -> anyhow::Result<PathBuf> {
        let path = transcript_path(&self.root, &self.id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(record)?;
        write_atomic(&path, &json)?;
        info!("Transcript saved: {}", path.display());
        Ok(path)
    }

    /// Finish the run and hand back the screenshot list.
    ///
    /// After a failure the directory is removed if nothing was written to it;
    /// finished artifacts are always kept.
    pub fn finish(self, failed: bool) -> Vec<PathBuf> {
        if failed {
            let empty = std::fs::read_dir(&self.dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if empty {
                if let Err(e) = std::fs::remove_dir(&self.dir) {
                    warn!("could not remove empty {}: {}", self.dir.display(), e);
                }
            }
        }
        self.screenshots
    }
}
