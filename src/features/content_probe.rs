//! Multi-strategy text extraction from a loaded post.
//!
//! The platform's class names change without notice, so each channel is an
//! ordered fallback chain of structural strategies; the first strategy that
//! matches anything supplies the channel's text.

use anyhow::Result;
use tracing::{info, warn};

use crate::core::types::{TranscriptRecord, CAPTION_CHANNEL, CLOSED_CAPTIONS_CHANNEL};
use crate::scraping::page::PageDriver;

/// One way of pulling text out of the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// `textContent` of every match, joined with a space.
    AllText(String),
    /// Rendered text of the first match (primary content container).
    ContainerText(String),
}

impl ProbeStrategy {
    /// `Ok(None)` when nothing matches, so the chain moves on.
    async fn extract(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        match self {
            ProbeStrategy::AllText(css) => {
                let texts = page.text_contents(css).await?;
                if texts.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(texts.join(" ")))
                }
            }
            ProbeStrategy::ContainerText(css) => page.inner_text(css).await,
        }
    }
}

/// An extraction target with its own fallback chain.
#[derive(Clone, Debug)]
pub struct ProbeChannel {
    pub name: &'static str,
    pub strategies: Vec<ProbeStrategy>,
}

impl ProbeChannel {
    /// Text from the first matching strategy; `Ok(None)` if none matched.
    pub async fn run(&self, page: &dyn PageDriver) -> Result<Option<String>> {
        for strategy in &self.strategies {
            if let Some(text) = strategy.extract(page).await? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

fn all_text(selectors: &[&str]) -> Vec<ProbeStrategy> {
    selectors
        .iter()
        .map(|s| ProbeStrategy::AllText(s.to_string()))
        .collect()
}

/// Post caption. Falls back to the whole `<article>` text.
pub fn caption_channel() -> ProbeChannel {
    let mut strategies = all_text(&[
        r#"div[data-visualcompletion="caption-text"]"#,
        "div.caption-container",
        "span.caption",
        "div._a9zs",
        "div._a9zm",
        "div.C4VMK span",
        "article div._ae5q",
        r#"span[data-lexical-text="true"]"#,
    ]);
    strategies.push(ProbeStrategy::ContainerText("article".to_string()));
    ProbeChannel {
        name: CAPTION_CHANNEL,
        strategies,
    }
}

/// Closed captions / subtitles overlaid on the player.
pub fn closed_captions_channel() -> ProbeChannel {
    ProbeChannel {
        name: CLOSED_CAPTIONS_CHANNEL,
        strategies: all_text(&[
            "div.closed-captions",
            "div.subtitles-container",
            "div._a3gq",
            r#"div[data-visualcompletion="closed-captions"]"#,
            "div._9zwu",
        ]),
    }
}

pub fn default_channels() -> Vec<ProbeChannel> {
    vec![caption_channel(), closed_captions_channel()]
}

/// Run every channel independently; never fails.
///
/// A channel contributes a key only when its text is non-blank after
/// trimming. An error inside one channel is logged and does not stop the
/// others.
pub async fn probe_content(page: &dyn PageDriver, channels: &[ProbeChannel]) -> TranscriptRecord {
    let mut record = TranscriptRecord::new();

    for channel in channels {
        match channel.run(page).await {
            Ok(Some(text)) => {
                if record.insert(channel.name, &text) {
                    info!("content probe: {} found ({} chars)", channel.name, text.trim().len());
                } else {
                    info!("content probe: {} matched but was blank", channel.name);
                }
            }
            Ok(None) => info!("content probe: no {} found", channel.name),
            Err(e) => warn!("Error extracting {}: {}", channel.name, e),
        }
    }

    record
}
