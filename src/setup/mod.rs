//! Pre-flight checklist for the external programs reel-scout drives.
//!
//! Each program is described once as a [`Tool`]: which command needs it,
//! whether that command can run without it, and how to install it. Nothing
//! is installed automatically.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::config::{MediaFileConfig, ReelScoutConfig};
use crate::scraping::browser_manager;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    /// Missing, but only an optional command needs it.
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn is_fail(self) -> bool {
        matches!(self, CheckStatus::Fail)
    }

    fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallHint {
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetupCheck {
    pub id: String,
    pub title: String,
    pub status: CheckStatus,
    pub details: String,
    /// Commands that shell out to this program.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needed_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallHint>,
}

impl SetupCheck {
    pub fn new(id: &str, title: &str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status,
            details: details.into(),
            needed_by: Vec::new(),
            install: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetupReport {
    pub checks: Vec<SetupCheck>,
}

impl SetupReport {
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_fail())
    }

    /// Titles of failed checks.
    pub fn failures(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| c.status.is_fail())
            .map(|c| c.title.as_str())
            .collect()
    }

    /// One line for startup logs, e.g. `setup: 3 ok, 1 missing (optional), 0 missing`.
    pub fn summarize_for_logs(&self) -> String {
        let count = |s: CheckStatus| self.checks.iter().filter(|c| c.status == s).count();
        format!(
            "setup: {} ok, {} missing (optional), {} missing",
            count(CheckStatus::Pass),
            count(CheckStatus::Warn),
            count(CheckStatus::Fail)
        )
    }

    /// Log every missing program with its install steps.
    pub fn print_install_hints(&self) {
        for check in self.checks.iter().filter(|c| c.status != CheckStatus::Pass) {
            let Some(hint) = &check.install else {
                continue;
            };
            warn!("{} is missing: {}", check.title, check.details);
            for step in &hint.steps {
                eprintln!("  • {}", step);
            }
            if let Some(url) = &hint.docs_url {
                eprintln!("  • Docs: {}", url);
            }
        }
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "reel-scout pre-flight")?;
        for c in &self.checks {
            write!(f, "[{:<4}] {}", c.status.label(), c.title)?;
            if !c.needed_by.is_empty() {
                write!(f, " (used by {})", c.needed_by.join(", "))?;
            }
            writeln!(f, "\n  {}", c.details)?;
            if c.status == CheckStatus::Pass {
                continue;
            }
            if let Some(hint) = &c.install {
                for step in &hint.steps {
                    writeln!(f, "    - {}", step)?;
                }
                if let Some(url) = &hint.docs_url {
                    writeln!(f, "    - Docs: {}", url)?;
                }
            }
        }
        Ok(())
    }
}

/// A program reel-scout depends on.
pub struct Tool {
    pub id: &'static str,
    pub title: &'static str,
    pub needed_by: &'static [&'static str],
    /// Missing an optional tool is a warning, not a failure.
    pub optional: bool,
    pub steps: &'static [&'static str],
    pub docs_url: &'static str,
}

pub const BROWSER: Tool = Tool {
    id: "browser",
    title: "Browser (Chrome/Chromium)",
    needed_by: &["reel-scout"],
    optional: false,
    steps: &[
        "macOS: install Google Chrome",
        "Ubuntu/Debian: `sudo apt-get install -y chromium-browser`",
        "Or point CHROME_EXECUTABLE at an existing binary",
    ],
    docs_url: "https://www.google.com/chrome/",
};

pub const YT_DLP: Tool = Tool {
    id: "yt_dlp",
    title: "Video downloader (yt-dlp)",
    needed_by: &["reel-media"],
    optional: false,
    steps: &["`pip install yt-dlp` or `brew install yt-dlp`", "Or set YT_DLP_PATH"],
    docs_url: "https://github.com/yt-dlp/yt-dlp#installation",
};

pub const FFMPEG: Tool = Tool {
    id: "ffmpeg",
    title: "Audio extractor (ffmpeg)",
    needed_by: &["reel-media"],
    optional: false,
    steps: &[
        "macOS: `brew install ffmpeg`",
        "Ubuntu/Debian: `sudo apt-get install -y ffmpeg`",
        "Or set FFMPEG_PATH",
    ],
    docs_url: "https://ffmpeg.org/download.html",
};

pub const WHISPER: Tool = Tool {
    id: "whisper",
    title: "Speech-to-text (whisper)",
    needed_by: &["reel-transcribe"],
    optional: true,
    steps: &["`pip install -U openai-whisper`", "Or set WHISPER_PATH"],
    docs_url: "https://github.com/openai/whisper#setup",
};

/// Resolve `program` to an executable path: explicit paths must exist,
/// bare names are looked up on PATH.
pub fn locate_program(program: &str) -> Option<PathBuf> {
    if program.contains('/') || program.contains('\\') {
        let p = Path::new(program);
        return p.exists().then(|| p.to_path_buf());
    }
    which::which(program).ok()
}

/// Turn a lookup result for `tool` into a check.
pub fn tool_check(tool: &Tool, found: Option<PathBuf>, looked_for: &str) -> SetupCheck {
    let mut check = match found {
        Some(path) => SetupCheck::new(
            tool.id,
            tool.title,
            CheckStatus::Pass,
            format!("Found {}", path.display()),
        ),
        None => {
            let status = if tool.optional {
                CheckStatus::Warn
            } else {
                CheckStatus::Fail
            };
            let mut check = SetupCheck::new(
                tool.id,
                tool.title,
                status,
                format!("`{}` not found on PATH or at the configured location", looked_for),
            );
            check.install = Some(InstallHint {
                steps: tool.steps.iter().map(|s| s.to_string()).collect(),
                docs_url: Some(tool.docs_url.to_string()),
            });
            check
        }
    };
    check.needed_by = tool.needed_by.iter().map(|s| s.to_string()).collect();
    check
}

pub fn check_program(tool: &Tool, program: &str) -> SetupCheck {
    tool_check(tool, locate_program(program), program)
}

pub fn check_browser() -> SetupCheck {
    let found = browser_manager::find_chrome_executable().map(PathBuf::from);
    tool_check(&BROWSER, found, "chrome / chromium")
}

/// Checks required by the media pipeline (download + audio extraction).
pub fn check_media_tools(media: &MediaFileConfig) -> SetupReport {
    SetupReport {
        checks: vec![
            check_program(&YT_DLP, &media.resolve_yt_dlp()),
            check_program(&FFMPEG, &media.resolve_ffmpeg()),
        ],
    }
}

/// Everything reel-scout can drive.
pub fn check_all(config: &ReelScoutConfig) -> SetupReport {
    let mut report = SetupReport::default();
    report.checks.push(check_browser());
    report.checks.extend(check_media_tools(&config.media).checks);
    report
        .checks
        .push(check_program(&WHISPER, &config.media.resolve_whisper()));
    report
}
