//! Native browser management using `chromiumoxide`.
//!
//! This module is the single source of truth for:
//! * Finding a usable browser executable (Brave → Chrome → Chromium, cross-platform).
//! * Building the launch config (visible by default, see [`HeadlessPolicy`]).
//! * `BrowserSession`: one exclusively-owned browser + tab implementing
//!   [`PageDriver`] over CDP.
//!
//! Stealth model:
//! - This module provides *process-level* defaults (user-agent rotation, browser flags).
//! - JS-level stealth injection is applied right after the tab opens (see `stealth.rs`).
//!
//! [`HeadlessPolicy`]: crate::core::config::HeadlessPolicy

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use rand::seq::IndexedRandom;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::page::{js_string, Locator, PageDriver};
use super::stealth;
use crate::core::config::{self, CaptureSettings};

// ── Realistic User-Agent pool ────────────────────────────────────────────────

const DESKTOP_USER_AGENTS: &[&str] = &[
    // Chrome 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 132 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 131 – Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Edge 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
];

/// Returns a randomly-chosen realistic desktop User-Agent string.
///
/// Only Chromium-family agents: a Firefox/Safari UA on a Chromium engine is
/// itself a detection signal.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan – finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = config::chrome_executable_override() {
        return Some(p);
    }

    for exe in [
        "google-chrome",
        "chromium",
        "chromium-browser",
        "chrome",
        "brave-browser",
        "brave",
    ] {
        if let Ok(path) = which::which(exe) {
            return Some(path.to_string_lossy().to_string());
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
            "/snap/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

// ── Browser config builder ───────────────────────────────────────────────────

/// Launch flags shared by visible and headless runs.
///
/// * `--disable-blink-features=AutomationControlled` hides `navigator.webdriver`.
/// * `--autoplay-policy=no-user-gesture-required` keeps the post's video
///   playing; a paused player would end the capture loop immediately.
pub fn launch_args(user_agent: &str) -> Vec<String> {
    vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-accelerated-2d-canvas".to_string(),
        "--disable-gpu".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--autoplay-policy=no-user-gesture-required".to_string(),
        "--lang=en-US".to_string(),
        format!("--user-agent={}", user_agent),
    ]
}

/// Build a `BrowserConfig` for a capture run.
pub fn build_capture_config(exe: &str, settings: &CaptureSettings) -> Result<BrowserConfig> {
    let ua = settings
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_string());

    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width: settings.viewport_width,
            height: settings.viewport_height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(settings.viewport_width, settings.viewport_height)
        .args(launch_args(&ua));

    if !settings.headless {
        builder = builder.with_head();
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

// ── Browser session ──────────────────────────────────────────────────────────

/// One launched browser with a single working tab.
///
/// Owned by exactly one capture run. Call [`close`](Self::close) on every
/// exit path; `Drop` only stops the CDP handler task.
pub struct BrowserSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a browser, open a blank tab and inject the stealth script.
    pub async fn launch(settings: &CaptureSettings) -> Result<Self> {
        let exe = find_chrome_executable().ok_or_else(|| {
            anyhow!("No browser found. Install Chrome or Chromium, or set CHROME_EXECUTABLE.")
        })?;

        info!(
            "🚀 launching {} browser ({}) @ {}×{}",
            if settings.headless { "headless" } else { "visible" },
            exe,
            settings.viewport_width,
            settings.viewport_height
        );

        let config = build_capture_config(&exe, settings)?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser ({}): {}", exe, e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP handler error: {}", e);
                }
            }
        });

        let page = match Self::open_tab(&browser).await {
            Ok(page) => page,
            Err(e) => {
                browser.close().await.ok();
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
        })
    }

    async fn open_tab(browser: &Browser) -> Result<Page> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow!("Failed to create page: {}", e))?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            stealth::stealth_script(),
        ))
        .await
        .map_err(|e| anyhow!("Failed to inject stealth script: {}", e))?;

        Ok(page)
    }

    /// Close the browser. Safe to call more than once.
    pub async fn close(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close error (non-fatal): {}", e);
            }
            browser.wait().await.ok();
            info!("🛑 browser session closed");
        }
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| anyhow!("Failed to navigate: {}", e))?;
        Ok(())
    }

    async fn match_count(&self, locator: &Locator) -> Result<usize> {
        let value = self
            .evaluate(&format!("({}).length", locator.to_js_query()))
            .await?;
        as_count(&value, locator)
    }

    async fn click_first(&self, locator: &Locator) -> Result<()> {
        match locator {
            Locator::Css(css) => {
                let element = self
                    .page
                    .find_element(css.as_str())
                    .await
                    .map_err(|e| anyhow!("element {} not found: {}", css, e))?;
                element
                    .click()
                    .await
                    .map_err(|e| anyhow!("click on {} failed: {}", css, e))?;
            }
            Locator::Text { .. } => {
                let script = format!(
                    "(() => {{ const els = {}; if (!els.length) return false; els[0].click(); return true; }})()",
                    locator.to_js_query()
                );
                let clicked = self.evaluate(&script).await?.as_bool().unwrap_or(false);
                if !clicked {
                    anyhow::bail!("element {} detached before click", locator);
                }
            }
        }
        Ok(())
    }

    async fn text_contents(&self, css: &str) -> Result<Vec<String>> {
        let script = format!(
            "{}.map(el => el.textContent || '')",
            Locator::css(css).to_js_query()
        );
        let value = self.evaluate(&script).await?;
        serde_json::from_value(value).map_err(|e| anyhow!("unexpected text list for {}: {}", css, e))
    }

    async fn inner_text(&self, css: &str) -> Result<Option<String>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el ? [el.innerText || ''] : []; }})()",
            js_string(css)
        );
        let value = self.evaluate(&script).await?;
        let found: Vec<String> = serde_json::from_value(value)
            .map_err(|e| anyhow!("unexpected inner text for {}: {}", css, e))?;
        Ok(found.into_iter().next())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| anyhow!("evaluate failed: {}", e))?;
        result
            .into_value::<serde_json::Value>()
            .map_err(|e| anyhow!("script returned no usable value: {}", e))
    }

    /// Playwright-style networkidle heuristic: `document.readyState` is
    /// `complete` and the resource-entry count has not changed for 1 s.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<bool> {
        let poll = Duration::from_millis(250);
        let quiet = Duration::from_millis(1000);
        let start = tokio::time::Instant::now();
        let mut last_count: usize = 0;
        let mut stable_since = tokio::time::Instant::now();

        loop {
            if start.elapsed() >= timeout {
                info!("network idle: timeout after {}ms", timeout.as_millis());
                return Ok(false);
            }

            let count = as_count(
                &self
                    .evaluate("performance.getEntriesByType('resource').length")
                    .await?,
                &"resource entries",
            )?;
            let ready_complete = self.evaluate("document.readyState").await? == "complete";

            if !ready_complete || count != last_count {
                last_count = count;
                stable_since = tokio::time::Instant::now();
            } else if stable_since.elapsed() >= quiet {
                info!(
                    "network idle after {}ms ({} resources)",
                    start.elapsed().as_millis(),
                    count
                );
                return Ok(true);
            }

            tokio::time::sleep(poll).await;
        }
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .map_err(|e| anyhow!("screenshot capture failed: {}", e))
    }
}

/// A JS result that must be a non-negative integer.
fn as_count(value: &serde_json::Value, what: &dyn std::fmt::Display) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| anyhow!("expected a count for {}, got {}", what, value))
}
