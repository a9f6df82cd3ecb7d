//! "Is the media still playing?", a soft stop hint for the capture loop.
//!
//! There is no reliable end-of-video signal on the platform, so the check is
//! a replaceable strategy. The wall-clock ceiling in the capture loop stays
//! authoritative whatever the strategy reports.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::scraping::page::PageDriver;

#[async_trait]
pub trait PlaybackProbe: Send + Sync {
    /// `Ok(false)` means playback is over. Errors are read as "unknown" by
    /// the caller and do not stop capture.
    async fn still_playing(&self, page: &dyn PageDriver) -> Result<bool>;
}

/// Native state of the first `<video>` element: playing unless paused or
/// ended. A page without a video counts as ended.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoElementPlayback;

const VIDEO_PLAYING_JS: &str = r#"(() => {
    const video = document.querySelector('video');
    if (video) {
        return !video.paused && !video.ended;
    }
    return false;
})()"#;

#[async_trait]
impl PlaybackProbe for VideoElementPlayback {
    async fn still_playing(&self, page: &dyn PageDriver) -> Result<bool> {
        let value = page.evaluate(VIDEO_PLAYING_JS).await?;
        value
            .as_bool()
            .ok_or_else(|| anyhow!("unexpected playback state: {}", value))
    }
}

/// Never reports an end; capture always runs the full duration budget.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedDuration;

#[async_trait]
impl PlaybackProbe for FixedDuration {
    async fn still_playing(&self, _page: &dyn PageDriver) -> Result<bool> {
        Ok(true)
    }
}
