//! Time-boxed capture of one post.
//!
//! States run strictly in order:
//!
//! ```text
//! Navigating → Stabilizing → ProbingVideo → ExtractingTranscript → Capturing → Done
//!      └──────────────┴──────────────┴────────────────┴──────────────┴──→ Failed
//! ```
//!
//! Only navigation and artifact writes can fail a run. Dialog dismissal, the
//! media-element wait, network idle and content probing degrade to log lines.
//! Capturing stops when the playback probe reports the end or when the
//! wall-clock budget runs out, whichever comes first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use super::capture_session::CaptureSession;
use super::content_probe::{self, ProbeChannel};
use super::dialogs;
use super::playback::{PlaybackProbe, VideoElementPlayback};
use crate::core::config::CaptureSettings;
use crate::core::identifier::content_id_or_timestamp;
use crate::core::types::{
    CaptureOutcome, CaptureReport, ErrorResponse, StopReason, TranscriptRecord,
};
use crate::scraping::browser_manager::BrowserSession;
use crate::scraping::page::{Locator, PageDriver};

pub const INITIAL_SCREENSHOT: &str = "initial_page.png";

/// Upper bound on the overview screenshot taken before probing.
pub const INITIAL_SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Navigating,
    Stabilizing,
    ProbingVideo,
    ExtractingTranscript,
    Capturing,
    Done,
    Failed,
}

fn log_state(state: CaptureState) {
    info!("capture_state={:?}", state);
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no browser found; install Chrome or Chromium, or set CHROME_EXECUTABLE")]
    BrowserUnavailable,

    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u128 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("artifact write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Media element selectors, most specific last.
pub fn default_video_selectors() -> Vec<Locator> {
    ["video", "[role=button] video", ".tWeCl video", ".EmbeddedMediaVideo"]
        .into_iter()
        .map(Locator::css)
        .collect()
}

/// Drives one post through the capture states against a [`PageDriver`].
pub struct CaptureLoop {
    settings: CaptureSettings,
    output_root: PathBuf,
    dismiss_targets: Vec<Locator>,
    video_selectors: Vec<Locator>,
    channels: Vec<ProbeChannel>,
    playback: Box<dyn PlaybackProbe>,
}

impl CaptureLoop {
    pub fn new(settings: CaptureSettings, output_root: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_root: output_root.into(),
            dismiss_targets: dialogs::default_dismiss_targets(),
            video_selectors: default_video_selectors(),
            channels: content_probe::default_channels(),
            playback: Box::new(VideoElementPlayback),
        }
    }

    /// Replace the end-of-video heuristic.
    pub fn with_playback_probe(mut self, probe: impl PlaybackProbe + 'static) -> Self {
        self.playback = Box::new(probe);
        self
    }

    pub fn with_dismiss_targets(mut self, targets: Vec<Locator>) -> Self {
        self.dismiss_targets = targets;
        self
    }

    pub fn with_video_selectors(mut self, selectors: Vec<Locator>) -> Self {
        self.video_selectors = selectors;
        self
    }

    pub fn with_channels(mut self, channels: Vec<ProbeChannel>) -> Self {
        self.channels = channels;
        self
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run every state for `url`. The caller owns `page` and must release it
    /// afterwards whatever the result.
    pub async fn run(&self, page: &dyn PageDriver, url: &str) -> Result<CaptureReport, CaptureError> {
        let id = content_id_or_timestamp(url);
        info!("Processing reel: {}", id);

        let mut session = CaptureSession::create(&self.output_root, id.clone())?;

        match self.drive(page, url, &mut session).await {
            Ok((video_found, transcript, stop_reason)) => {
                log_state(CaptureState::Done);
                Ok(CaptureReport {
                    reel_id: id,
                    url: url.to_string(),
                    transcript,
                    screenshots: session.finish(false),
                    video_found,
                    stop_reason,
                })
            }
            Err(e) => {
                log_state(CaptureState::Failed);
                warn!("capture of {} failed: {}", url, e);
                session.finish(true);
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        page: &dyn PageDriver,
        url: &str,
        session: &mut CaptureSession,
    ) -> Result<(bool, TranscriptRecord, StopReason), CaptureError> {
        log_state(CaptureState::Navigating);
        self.navigate(page, url).await?;

        log_state(CaptureState::Stabilizing);
        self.stabilize(page, session).await;

        log_state(CaptureState::ProbingVideo);
        let video_found = self.probe_video(page).await;

        log_state(CaptureState::ExtractingTranscript);
        let transcript = self.extract_transcript(page, session).await?;

        log_state(CaptureState::Capturing);
        let stop_reason = self.capture_frames(page, session).await?;

        Ok((video_found, transcript, stop_reason))
    }

    /// Single attempt, bounded by the navigation timeout.
    async fn navigate(&self, page: &dyn PageDriver, url: &str) -> Result<(), CaptureError> {
        info!("Navigating to {}", url);
        let timeout = self.settings.navigation_timeout;
        match tokio::time::timeout(timeout, page.navigate(url)).await {
            Ok(Ok(())) => {
                info!("Page loaded, waiting for content...");
                Ok(())
            }
            Ok(Err(e)) => Err(CaptureError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CaptureError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis(),
            }),
        }
    }

    async fn stabilize(&self, page: &dyn PageDriver, session: &CaptureSession) {
        let report =
            dialogs::dismiss_dialogs(page, &self.dismiss_targets, self.settings.dialog_settle)
                .await;
        if !report.clicked.is_empty() {
            info!("dismissed {} dialog(s)", report.clicked.len());
        }

        tokio::time::sleep(self.settings.stabilize_delay).await;

        match tokio::time::timeout(INITIAL_SCREENSHOT_TIMEOUT, page.screenshot_png()).await {
            Ok(Ok(png)) => match session.save_named(INITIAL_SCREENSHOT, &png) {
                Ok(path) => info!("Initial screenshot saved: {}", path.display()),
                Err(e) => warn!("initial screenshot write failed: {}", e),
            },
            Ok(Err(e)) => warn!("initial screenshot failed: {}", e),
            Err(_) => warn!(
                "initial screenshot timed out after {}s",
                INITIAL_SCREENSHOT_TIMEOUT.as_secs()
            ),
        }
    }

    /// First selector that attaches wins; exhausting the list is not fatal.
    async fn probe_video(&self, page: &dyn PageDriver) -> bool {
        for selector in &self.video_selectors {
            info!("Looking for video with selector: {}", selector);
            match page.wait_for(selector, self.settings.video_wait).await {
                Ok(()) => {
                    info!("Found video with selector: {}", selector);
                    return true;
                }
                Err(e) => info!("Selector {} not found: {}", selector, e),
            }
        }
        warn!("Could not find video element, continuing anyway...");
        false
    }

    async fn extract_transcript(
        &self,
        page: &dyn PageDriver,
        session: &CaptureSession,
    ) -> Result<TranscriptRecord, CaptureError> {
        let idle_timeout = self.settings.network_idle_timeout;
        match tokio::time::timeout(idle_timeout, page.wait_for_network_idle(idle_timeout)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) | Err(_) => warn!(
                "network did not go idle within {}ms; probing anyway",
                idle_timeout.as_millis()
            ),
            Ok(Err(e)) => warn!("network idle check failed: {}; probing anyway", e),
        }

        let record = content_probe::probe_content(page, &self.channels).await;
        session
            .save_transcript(&record)
            .map_err(|e| CaptureError::Capture(format!("transcript write failed: {}", e)))?;
        Ok(record)
    }

    /// Screenshot, sleep, check playback; repeat while under budget.
    ///
    /// The screenshot is bounded by the remaining budget and the playback
    /// check by `min(interval, remaining)`, so the loop returns within
    /// `max_duration + interval` whatever the page does.
    async fn capture_frames(
        &self,
        page: &dyn PageDriver,
        session: &mut CaptureSession,
    ) -> Result<StopReason, CaptureError> {
        let interval = self.settings.interval;
        let max_duration = self.settings.max_duration;
        info!(
            "Taking screenshots every {}s (max {}s)...",
            interval.as_secs_f64(),
            max_duration.as_secs_f64()
        );

        let start = Instant::now();
        while start.elapsed() < max_duration {
            let seq = session.next_seq();
            let remaining = max_duration.saturating_sub(start.elapsed());
            let png = match tokio::time::timeout(remaining, page.screenshot_png()).await {
                Ok(Ok(png)) => png,
                Ok(Err(e)) => {
                    return Err(CaptureError::Capture(format!(
                        "screenshot {} failed: {}",
                        seq, e
                    )))
                }
                Err(_) => {
                    warn!("screenshot {} still pending when the budget ran out", seq);
                    break;
                }
            };
            session.save_screenshot(&png)?;

            tokio::time::sleep(interval).await;

            let remaining = max_duration.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            let check = tokio::time::timeout(interval.min(remaining), self.playback.still_playing(page));
            match check.await {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    info!("Video appears to have ended");
                    return Ok(StopReason::PlaybackEnded);
                }
                Ok(Err(e)) => warn!("Error checking video state (assuming still playing): {}", e),
                Err(_) => warn!("video state check timed out (assuming still playing)"),
            }
        }

        info!(
            "capture budget of {}s exhausted after {} screenshot(s)",
            max_duration.as_secs_f64(),
            session.next_seq()
        );
        Ok(StopReason::DurationElapsed)
    }
}

/// Launch a browser, run the capture states for `url`, and always close the
/// browser again. Errors come back as an `error` object.
pub async fn capture_reel(capture: &CaptureLoop, url: &str) -> CaptureOutcome {
    if crate::scraping::browser_manager::find_chrome_executable().is_none() {
        return failed(CaptureError::BrowserUnavailable);
    }

    let browser = match BrowserSession::launch(capture.settings()).await {
        Ok(b) => b,
        Err(e) => return failed(CaptureError::BrowserLaunch(e.to_string())),
    };

    let result = capture.run(&browser, url).await;
    browser.close().await;

    match result {
        Ok(report) => CaptureOutcome::Completed(report),
        Err(e) => failed(e),
    }
}

fn failed(e: CaptureError) -> CaptureOutcome {
    tracing::error!("Error scraping reel: {}", e);
    CaptureOutcome::Failed(ErrorResponse::new(e.to_string()))
}

/// Upper bound on screenshots for a budget: one per started interval.
pub fn max_screenshots(max_duration: Duration, interval: Duration) -> usize {
    if interval.is_zero() {
        return usize::MAX;
    }
    (max_duration.as_nanos().div_ceil(interval.as_nanos())) as usize
}
