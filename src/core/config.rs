use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// ReelScoutConfig: file-based config loader (reel-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "REEL_SCOUT_CONFIG";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_NAV_TIMEOUT_MS: &str = "REEL_SCOUT_NAV_TIMEOUT_MS";
pub const ENV_YT_DLP_PATH: &str = "YT_DLP_PATH";
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";
pub const ENV_WHISPER_PATH: &str = "WHISPER_PATH";

/// Whether capture honours the caller's headless request.
///
/// Headless Chromium is trivially fingerprinted by the target platform, so the
/// default overrides `--headless` and always opens a visible window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadlessPolicy {
    #[default]
    ForceVisible,
    Respect,
}

impl HeadlessPolicy {
    /// Effective headless flag for a requested one.
    pub fn resolve(self, requested: bool) -> bool {
        match self {
            HeadlessPolicy::ForceVisible => false,
            HeadlessPolicy::Respect => requested,
        }
    }
}

/// `capture` section of reel-scout.json.
#[derive(Deserialize, Default, Clone, Debug)]
pub struct CaptureFileConfig {
    /// Navigation budget in ms. Default: 60000.
    pub navigation_timeout_ms: Option<u64>,
    /// Wait after dialog dismissal before probing. Default: 5000.
    pub stabilize_ms: Option<u64>,
    /// Wait after each dialog click. Default: 1000.
    pub dialog_settle_ms: Option<u64>,
    /// Per-selector wait for the media element. Default: 10000.
    pub video_wait_ms: Option<u64>,
    /// Network-idle budget before probing content. Default: 15000.
    pub network_idle_timeout_ms: Option<u64>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    /// Fixed user agent; a random desktop UA is used when unset.
    pub user_agent: Option<String>,
    pub headless_policy: Option<HeadlessPolicy>,
}

/// `media` section of reel-scout.json.
#[derive(Deserialize, Default, Clone, Debug)]
pub struct MediaFileConfig {
    pub yt_dlp_path: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub whisper_path: Option<String>,
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn env_non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl MediaFileConfig {
    /// yt-dlp: JSON field → `YT_DLP_PATH` → `yt-dlp` on PATH.
    pub fn resolve_yt_dlp(&self) -> String {
        non_blank(&self.yt_dlp_path)
            .or_else(|| env_non_blank(ENV_YT_DLP_PATH))
            .unwrap_or_else(|| "yt-dlp".to_string())
    }

    /// ffmpeg: JSON field → `FFMPEG_PATH` → `ffmpeg` on PATH.
    pub fn resolve_ffmpeg(&self) -> String {
        non_blank(&self.ffmpeg_path)
            .or_else(|| env_non_blank(ENV_FFMPEG_PATH))
            .unwrap_or_else(|| "ffmpeg".to_string())
    }

    /// whisper: JSON field → `WHISPER_PATH` → `whisper` on PATH.
    pub fn resolve_whisper(&self) -> String {
        non_blank(&self.whisper_path)
            .or_else(|| env_non_blank(ENV_WHISPER_PATH))
            .unwrap_or_else(|| "whisper".to_string())
    }
}

/// Top-level config loaded from `reel-scout.json`.
#[derive(Deserialize, Default, Clone, Debug)]
pub struct ReelScoutConfig {
    #[serde(default)]
    pub capture: CaptureFileConfig,
    #[serde(default)]
    pub media: MediaFileConfig,
}

/// Timing and browser knobs for one capture run, fully resolved.
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    pub interval: Duration,
    pub max_duration: Duration,
    pub navigation_timeout: Duration,
    pub stabilize_delay: Duration,
    pub dialog_settle: Duration,
    pub video_wait: Duration,
    pub network_idle_timeout: Duration,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: Option<String>,
    pub headless: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_duration: Duration::from_secs(60),
            navigation_timeout: Duration::from_millis(60_000),
            stabilize_delay: Duration::from_millis(5_000),
            dialog_settle: Duration::from_millis(1_000),
            video_wait: Duration::from_millis(10_000),
            network_idle_timeout: Duration::from_millis(15_000),
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: None,
            headless: false,
        }
    }
}

impl ReelScoutConfig {
    /// Resolve capture settings for a run.
    ///
    /// `headless` is the caller's request; the configured [`HeadlessPolicy`]
    /// decides whether it is honoured.
    pub fn capture_settings(
        &self,
        interval: Duration,
        max_duration: Duration,
        headless: bool,
    ) -> CaptureSettings {
        let defaults = CaptureSettings::default();
        let c = &self.capture;
        let ms = |v: Option<u64>, d: Duration| v.map(Duration::from_millis).unwrap_or(d);

        let navigation_timeout = c
            .navigation_timeout_ms
            .or_else(|| env_non_blank(ENV_NAV_TIMEOUT_MS).and_then(|v| v.parse().ok()))
            .map(Duration::from_millis)
            .unwrap_or(defaults.navigation_timeout);

        CaptureSettings {
            interval,
            max_duration,
            navigation_timeout,
            stabilize_delay: ms(c.stabilize_ms, defaults.stabilize_delay),
            dialog_settle: ms(c.dialog_settle_ms, defaults.dialog_settle),
            video_wait: ms(c.video_wait_ms, defaults.video_wait),
            network_idle_timeout: ms(c.network_idle_timeout_ms, defaults.network_idle_timeout),
            viewport_width: c.viewport_width.unwrap_or(defaults.viewport_width),
            viewport_height: c.viewport_height.unwrap_or(defaults.viewport_height),
            user_agent: non_blank(&c.user_agent),
            headless: c.headless_policy.unwrap_or_default().resolve(headless),
        }
    }
}

/// Load `reel-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `REEL_SCOUT_CONFIG` env var path
/// 2. `./reel-scout.json`
/// 3. `~/.reel-scout/config.json`
///
/// Missing file → `ReelScoutConfig::default()` (env-var fallbacks apply).
/// Parse error → log a warning, return defaults.
pub fn load_config() -> ReelScoutConfig {
    let mut candidates: Vec<PathBuf> = vec![PathBuf::from("reel-scout.json")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".reel-scout").join("config.json"));
    }
    if let Some(env_path) = env_non_blank(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        if let Some(cfg) = load_config_from(path) {
            return cfg;
        }
    }
    ReelScoutConfig::default()
}

/// Parse one candidate file. `None` when the file is absent; a parse error
/// is logged and yields defaults so a broken file never blocks a run.
pub fn load_config_from(path: &Path) -> Option<ReelScoutConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ReelScoutConfig>(&contents) {
        Ok(cfg) => {
            tracing::info!("reel-scout.json loaded from {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(
                "reel-scout.json parse error at {}: {}; using defaults",
                path.display(),
                e
            );
            Some(ReelScoutConfig::default())
        }
    }
}

/// Optional override for the Chromium-family browser executable.
///
/// Only returns a value when `CHROME_EXECUTABLE` points at an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = env_non_blank(ENV_CHROME_EXECUTABLE)?;
    if Path::new(&p).exists() {
        Some(p)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn force_visible_ignores_headless_request() {
        assert!(!HeadlessPolicy::ForceVisible.resolve(true));
        assert!(HeadlessPolicy::Respect.resolve(true));
        assert!(!HeadlessPolicy::Respect.resolve(false));
    }

    #[test]
    fn defaults_apply_without_file() {
        let cfg = ReelScoutConfig::default();
        let s = cfg.capture_settings(Duration::from_secs(3), Duration::from_secs(30), true);
        assert_eq!(s.interval, Duration::from_secs(3));
        assert_eq!(s.max_duration, Duration::from_secs(30));
        assert_eq!(s.stabilize_delay, Duration::from_secs(5));
        assert_eq!(s.video_wait, Duration::from_secs(10));
        assert!(!s.headless);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "capture": {{ "stabilize_ms": 250, "headless_policy": "respect", "user_agent": "  " }},
                "media": {{ "ffmpeg_path": "/opt/ffmpeg/bin/ffmpeg" }}
            }}"#
        )
        .unwrap();

        let cfg = load_config_from(file.path()).expect("file exists");
        let s = cfg.capture_settings(Duration::from_secs(2), Duration::from_secs(60), true);
        assert_eq!(s.stabilize_delay, Duration::from_millis(250));
        assert!(s.headless);
        assert!(s.user_agent.is_none());
        assert_eq!(cfg.media.resolve_ffmpeg(), "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let cfg = load_config_from(file.path()).expect("file exists");
        assert!(cfg.capture.stabilize_ms.is_none());
    }

    #[test]
    fn missing_file_is_none() {
        assert!(load_config_from(Path::new("/definitely/not/here/reel-scout.json")).is_none());
    }
}
