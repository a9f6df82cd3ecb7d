//! The page seam between capture logic and the browser.
//!
//! Capture states, dialog dismissal and content probing only talk to a
//! [`PageDriver`]; the CDP-backed implementation lives in
//! [`super::browser_manager::BrowserSession`]. Keeping the seam narrow lets the
//! state machine run against an in-memory page in tests.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// How an element on the page is located.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    /// Plain CSS selector.
    Css(String),
    /// Element of `tag` whose trimmed visible text contains `text`.
    Text { tag: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn button_text(text: impl Into<String>) -> Self {
        Locator::Text {
            tag: "button".to_string(),
            text: text.into(),
        }
    }

    /// JS expression evaluating to an array of the matching elements.
    pub fn to_js_query(&self) -> String {
        match self {
            Locator::Css(css) => format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(css)
            ),
            Locator::Text { tag, text } => format!(
                "Array.from(document.querySelectorAll({})).filter(el => (el.innerText || el.textContent || '').trim().includes({}))",
                js_string(tag),
                js_string(text)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(css) => f.write_str(css),
            Locator::Text { tag, text } => write!(f, "{}:has-text(\"{}\")", tag, text),
        }
    }
}

/// Quote `s` as a JS string literal.
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// One browser tab, as seen by the capture pipeline.
///
/// Every method may fail; callers decide whether a failure is fatal.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url`. Callers bound the wait; this may block until the page
    /// commits.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Number of elements currently matching `locator`.
    async fn match_count(&self, locator: &Locator) -> Result<usize>;

    /// Click the first element matching `locator`.
    async fn click_first(&self, locator: &Locator) -> Result<()>;

    /// `textContent` of every element matching `css`, in document order.
    async fn text_contents(&self, css: &str) -> Result<Vec<String>>;

    /// Rendered `innerText` of the first element matching `css`, if any.
    async fn inner_text(&self, css: &str) -> Result<Option<String>>;

    /// Evaluate a JS expression and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Wait until the network looks idle. `Ok(false)` on timeout.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<bool>;

    /// PNG screenshot of the current viewport.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// Wait until `locator` matches at least one element.
    ///
    /// Polls [`match_count`](Self::match_count) every 250 ms; count errors
    /// are treated as "not yet".
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let poll = Duration::from_millis(250);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if matches!(self.match_count(locator).await, Ok(n) if n > 0) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("timed out after {}ms waiting for {}", timeout.as_millis(), locator);
            }
            tokio::time::sleep(poll).await;
        }
    }
}
