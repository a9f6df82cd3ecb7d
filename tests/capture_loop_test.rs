mod common;

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::{init_logger, FakePage, IdleBehavior, NavBehavior};
use reel_scout::core::config::CaptureSettings;
use reel_scout::features::capture::{
    max_screenshots, CaptureError, CaptureLoop, INITIAL_SCREENSHOT, INITIAL_SCREENSHOT_TIMEOUT,
};
use reel_scout::features::content_probe::closed_captions_channel;
use reel_scout::features::playback::{PlaybackProbe, VideoElementPlayback};
use reel_scout::scraping::page::{Locator, PageDriver};
use reel_scout::StopReason;
use tokio::time::Instant;

const URL: &str = "https://www.instagram.com/reel/ABC123/";

fn settings(interval: u64, max_duration: u64) -> CaptureSettings {
    CaptureSettings {
        interval: Duration::from_secs(interval),
        max_duration: Duration::from_secs(max_duration),
        stabilize_delay: Duration::ZERO,
        dialog_settle: Duration::ZERO,
        ..CaptureSettings::default()
    }
}

struct Always(bool);

#[async_trait]
impl PlaybackProbe for Always {
    async fn still_playing(&self, _page: &dyn PageDriver) -> Result<bool> {
        Ok(self.0)
    }
}

struct Broken;

#[async_trait]
impl PlaybackProbe for Broken {
    async fn still_playing(&self, _page: &dyn PageDriver) -> Result<bool> {
        Err(anyhow!("video element detached"))
    }
}

/// Answers long after any sensible interval.
struct Stalled;

#[async_trait]
impl PlaybackProbe for Stalled {
    async fn still_playing(&self, _page: &dyn PageDriver) -> Result<bool> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(false)
    }
}

const CAPTION_CSS: &str = r#"div[data-visualcompletion="caption-text"]"#;

#[tokio::test(start_paused = true)]
async fn playing_video_runs_the_whole_budget() {
    init_logger();
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new().with_video();
    let capture = CaptureLoop::new(settings(2, 5), root.path()).with_playback_probe(Always(true));

    let started = Instant::now();
    let report = capture.run(&page, URL).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.reel_id.as_str(), "ABC123");
    assert_eq!(report.stop_reason, StopReason::DurationElapsed);
    assert!(report.video_found);
    assert_eq!(report.screenshots.len(), 3);
    assert!(report.screenshots.len() <= max_screenshots(Duration::from_secs(5), Duration::from_secs(2)));
    assert!(elapsed <= Duration::from_secs(5 + 2), "took {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn screenshots_are_contiguous_and_zero_padded() {
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new().with_video();
    let capture = CaptureLoop::new(settings(1, 4), root.path()).with_playback_probe(Always(true));

    let report = capture.run(&page, URL).await.unwrap();

    let names: Vec<String> = report
        .screenshots
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "screenshot_000.png",
            "screenshot_001.png",
            "screenshot_002.png",
            "screenshot_003.png"
        ]
    );
    let dir = root.path().join("screenshots").join("ABC123");
    assert!(dir.join(INITIAL_SCREENSHOT).exists());
    for name in &names {
        assert!(dir.join(name).exists());
    }
}

#[tokio::test(start_paused = true)]
async fn ended_video_stops_after_first_frame() {
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new().with_video();
    let capture = CaptureLoop::new(settings(2, 60), root.path()).with_playback_probe(Always(false));

    let started = Instant::now();
    let report = capture.run(&page, URL).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PlaybackEnded);
    assert_eq!(report.screenshots.len(), 1);
    assert!(started.elapsed() <= Duration::from_secs(60 + 2));
}

#[tokio::test(start_paused = true)]
async fn failing_playback_check_keeps_capturing_until_budget() {
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new().with_video();
    let capture = CaptureLoop::new(settings(2, 6), root.path()).with_playback_probe(Broken);

    let started = Instant::now();
    let report = capture.run(&page, URL).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::DurationElapsed);
    assert_eq!(report.screenshots.len(), 3);
    assert!(started.elapsed() <= Duration::from_secs(6 + 2));
}

#[tokio::test(start_paused = true)]
async fn paused_video_element_ends_capture() {
    let root = tempfile::tempdir().unwrap();
    let mut page = FakePage::new().with_video();
    page.evaluate_result = Some(serde_json::Value::Bool(false));
    let capture =
        CaptureLoop::new(settings(2, 30), root.path()).with_playback_probe(VideoElementPlayback);

    let report = capture.run(&page, URL).await.unwrap();
    assert_eq!(report.stop_reason, StopReason::PlaybackEnded);
}

#[tokio::test(start_paused = true)]
async fn missing_video_is_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new();
    let capture = CaptureLoop::new(settings(2, 2), root.path()).with_playback_probe(Always(true));

    let report = capture.run(&page, URL).await.unwrap();
    assert!(!report.video_found);
    assert_eq!(report.screenshots.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn transcript_is_written_with_probed_text() {
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new()
        .with_video()
        .with_texts(r#"div[data-visualcompletion="caption-text"]"#, &["  great reel  "]);
    let capture = CaptureLoop::new(settings(2, 2), root.path()).with_playback_probe(Always(false));

    let report = capture.run(&page, URL).await.unwrap();
    assert_eq!(report.transcript.get("caption"), Some("great reel"));

    let saved = std::fs::read_to_string(root.path().join("transcripts/ABC123_transcript.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved, serde_json::json!({ "caption": "great reel" }));
}

#[tokio::test(start_paused = true)]
async fn hung_navigation_times_out_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let mut page = FakePage::new();
    page.nav = NavBehavior::Hang;
    let capture = CaptureLoop::new(settings(2, 10), root.path());

    let err = capture.run(&page, URL).await.unwrap_err();
    assert!(
        matches!(err, CaptureError::NavigationTimeout { timeout_ms: 60_000, .. }),
        "{}",
        err
    );
    assert!(!root.path().join("screenshots/ABC123").exists());
    assert_eq!(page.screenshots_taken(), 0);
}

#[tokio::test(start_paused = true)]
async fn navigation_error_fails_the_run() {
    let root = tempfile::tempdir().unwrap();
    let mut page = FakePage::new();
    page.nav = NavBehavior::Fail("net::ERR_NAME_NOT_RESOLVED".into());
    let capture = CaptureLoop::new(settings(2, 10), root.path());

    let err = capture.run(&page, URL).await.unwrap_err();
    assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    assert!(!root.path().join("screenshots/ABC123").exists());
}

#[tokio::test(start_paused = true)]
async fn screenshot_failure_fails_the_run() {
    let root = tempfile::tempdir().unwrap();
    let mut page = FakePage::new().with_video();
    page.screenshot_fails = true;
    let capture = CaptureLoop::new(settings(2, 10), root.path()).with_playback_probe(Always(true));

    let err = capture.run(&page, URL).await.unwrap_err();
    assert!(matches!(err, CaptureError::Capture(_)), "{}", err);
    assert!(!root.path().join("screenshots/ABC123").exists());
}

#[tokio::test(start_paused = true)]
async fn url_without_marker_uses_timestamp_id() {
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new().with_video();
    let capture = CaptureLoop::new(settings(2, 2), root.path()).with_playback_probe(Always(false));

    let report = capture.run(&page, "https://example.com/watch").await.unwrap();
    let id = report.reel_id.as_str();
    assert_eq!(id.len(), 14);
    assert!(id.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test(start_paused = true)]
async fn slow_playback_check_cannot_outlast_the_budget() {
    init_logger();
    let root = tempfile::tempdir().unwrap();
    let page = FakePage::new().with_video();
    let capture = CaptureLoop::new(settings(2, 6), root.path()).with_playback_probe(Stalled);

    let started = Instant::now();
    let report = capture.run(&page, URL).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.stop_reason, StopReason::DurationElapsed);
    assert!(!report.screenshots.is_empty());
    assert!(elapsed <= Duration::from_secs(6 + 2), "took {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn slow_screenshots_cannot_outlast_the_budget() {
    let root = tempfile::tempdir().unwrap();
    let mut page = FakePage::new().with_video();
    page.screenshot_delay = Some(Duration::from_secs(30));
    let capture = CaptureLoop::new(settings(2, 6), root.path()).with_playback_probe(Always(true));

    let started = Instant::now();
    let report = capture.run(&page, URL).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.stop_reason, StopReason::DurationElapsed);
    assert!(report.screenshots.is_empty());
    assert!(
        elapsed <= INITIAL_SCREENSHOT_TIMEOUT + Duration::from_secs(6 + 2),
        "took {:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn busy_network_still_yields_a_transcript() {
    for idle in [IdleBehavior::Busy, IdleBehavior::Fail, IdleBehavior::Hang] {
        let root = tempfile::tempdir().unwrap();
        let mut page = FakePage::new()
            .with_video()
            .with_texts(CAPTION_CSS, &["still here"]);
        page.idle = idle.clone();
        let capture =
            CaptureLoop::new(settings(2, 2), root.path()).with_playback_probe(Always(false));

        let report = capture
            .run(&page, URL)
            .await
            .unwrap_or_else(|e| panic!("{:?}: {}", idle, e));
        assert_eq!(report.transcript.get("caption"), Some("still here"), "{:?}", idle);
        assert!(root.path().join("transcripts/ABC123_transcript.json").exists());
    }
}

#[tokio::test(start_paused = true)]
async fn login_prompt_is_dismissed_during_run() {
    let root = tempfile::tempdir().unwrap();
    let not_now = Locator::button_text("Not Now");
    let page = FakePage::new().with_video().with_count(&not_now, 1);
    let capture = CaptureLoop::new(settings(2, 2), root.path()).with_playback_probe(Always(false));

    capture.run(&page, URL).await.unwrap();
    assert_eq!(page.clicks(), vec![not_now.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn custom_targets_selectors_and_channels_are_used() {
    let root = tempfile::tempdir().unwrap();
    let overlay = Locator::css("div.promo-close");
    let player = Locator::css("div.player > video");
    let page = FakePage::new()
        .with_count(&overlay, 1)
        .with_count(&Locator::button_text("Not Now"), 1)
        .with_count(&player, 1)
        .with_texts(CAPTION_CSS, &["caption text"])
        .with_texts("div.closed-captions", &["spoken words"]);
    let capture = CaptureLoop::new(settings(2, 2), root.path())
        .with_playback_probe(Always(false))
        .with_dismiss_targets(vec![overlay.clone()])
        .with_video_selectors(vec![player])
        .with_channels(vec![closed_captions_channel()]);
    assert_eq!(capture.output_root(), root.path());

    let report = capture.run(&page, URL).await.unwrap();

    assert_eq!(page.clicks(), vec![overlay.to_string()]);
    assert!(report.video_found);
    assert_eq!(report.transcript.len(), 1);
    assert_eq!(
        report.transcript.channels().collect::<Vec<_>>(),
        vec!["closed_captions"]
    );
}
