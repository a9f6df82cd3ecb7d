//! In-memory page used by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reel_scout::scraping::page::{Locator, PageDriver};

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug, Default)]
pub enum NavBehavior {
    #[default]
    Load,
    Hang,
    Fail(String),
}

/// How `wait_for_network_idle` answers.
#[derive(Clone, Debug, Default)]
pub enum IdleBehavior {
    #[default]
    Idle,
    Busy,
    Fail,
    Hang,
}

/// Scripted page: every lookup is answered from the maps below, keyed by the
/// locator's display form or the raw CSS string.
#[derive(Default)]
pub struct FakePage {
    pub nav: NavBehavior,
    pub idle: IdleBehavior,
    pub counts: HashMap<String, usize>,
    pub count_errors: HashSet<String>,
    pub click_errors: HashSet<String>,
    pub texts: HashMap<String, Vec<String>>,
    pub text_errors: HashSet<String>,
    pub inner: HashMap<String, String>,
    pub evaluate_result: Option<serde_json::Value>,
    pub screenshot_fails: bool,
    pub screenshot_delay: Option<Duration>,
    pub clicks: Mutex<Vec<String>>,
    pub screenshots_taken: Mutex<usize>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, locator: &Locator, n: usize) -> Self {
        self.counts.insert(locator.to_string(), n);
        self
    }

    pub fn with_texts(mut self, css: &str, texts: &[&str]) -> Self {
        self.texts
            .insert(css.to_string(), texts.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_inner(mut self, css: &str, text: &str) -> Self {
        self.inner.insert(css.to_string(), text.to_string());
        self
    }

    /// A page with an attached `<video>` element.
    pub fn with_video(self) -> Self {
        self.with_count(&Locator::css("video"), 1)
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn screenshots_taken(&self) -> usize {
        *self.screenshots_taken.lock().unwrap()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, _url: &str) -> Result<()> {
        match &self.nav {
            NavBehavior::Load => Ok(()),
            NavBehavior::Hang => {
                futures::future::pending::<()>().await;
                Ok(())
            }
            NavBehavior::Fail(reason) => Err(anyhow!("{}", reason)),
        }
    }

    async fn match_count(&self, locator: &Locator) -> Result<usize> {
        let key = locator.to_string();
        if self.count_errors.contains(&key) {
            return Err(anyhow!("lookup of {} exploded", key));
        }
        Ok(self.counts.get(&key).copied().unwrap_or(0))
    }

    async fn click_first(&self, locator: &Locator) -> Result<()> {
        let key = locator.to_string();
        if self.click_errors.contains(&key) {
            return Err(anyhow!("element {} detached", key));
        }
        self.clicks.lock().unwrap().push(key);
        Ok(())
    }

    async fn text_contents(&self, css: &str) -> Result<Vec<String>> {
        if self.text_errors.contains(css) {
            return Err(anyhow!("evaluation of {} failed", css));
        }
        Ok(self.texts.get(css).cloned().unwrap_or_default())
    }

    async fn inner_text(&self, css: &str) -> Result<Option<String>> {
        Ok(self.inner.get(css).cloned())
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value> {
        self.evaluate_result
            .clone()
            .ok_or_else(|| anyhow!("execution context was destroyed"))
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<bool> {
        match self.idle {
            IdleBehavior::Idle => Ok(true),
            IdleBehavior::Busy => Ok(false),
            IdleBehavior::Fail => Err(anyhow!("Runtime.evaluate failed")),
            IdleBehavior::Hang => {
                futures::future::pending::<()>().await;
                Ok(true)
            }
        }
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        if let Some(delay) = self.screenshot_delay {
            tokio::time::sleep(delay).await;
        }
        if self.screenshot_fails {
            return Err(anyhow!("target closed"));
        }
        *self.screenshots_taken.lock().unwrap() += 1;
        Ok(b"\x89PNG fake".to_vec())
    }
}
