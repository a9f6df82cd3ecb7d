//! Best-effort removal of overlays that block the post (cookie consent,
//! close icons, "Not Now" login prompts).
//!
//! Every target is attempted in isolation: a missing element is normal, and a
//! failing count or click is logged and skipped so the next target still runs.

use std::time::Duration;
use tracing::{info, warn};

use crate::scraping::page::{Locator, PageDriver};

/// Default dismiss targets, in the order they are tried.
pub fn default_dismiss_targets() -> Vec<Locator> {
    let mut targets: Vec<Locator> = [
        "Accept",
        "Allow",
        "I Accept",
        "Accept All",
        "Continue",
        "Close",
    ]
    .into_iter()
    .map(Locator::button_text)
    .collect();
    targets.push(Locator::css(r#"[aria-label="Close"]"#));
    targets.push(Locator::css(r#"[aria-label="Cancel"]"#));
    // Login prompt
    targets.push(Locator::button_text("Not Now"));
    targets
}

/// What a dismissal pass did, for logs and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DismissReport {
    pub clicked: Vec<String>,
    pub failed: Vec<String>,
}

/// Try each target once; never fails.
pub async fn dismiss_dialogs(
    page: &dyn PageDriver,
    targets: &[Locator],
    settle: Duration,
) -> DismissReport {
    let mut report = DismissReport::default();

    for target in targets {
        let count = match page.match_count(target).await {
            Ok(n) => n,
            Err(e) => {
                warn!("dialog target {}: lookup failed: {}", target, e);
                report.failed.push(target.to_string());
                continue;
            }
        };
        if count == 0 {
            continue;
        }

        info!("Clicking dialog button: {}", target);
        match page.click_first(target).await {
            Ok(()) => {
                report.clicked.push(target.to_string());
                tokio::time::sleep(settle).await;
            }
            Err(e) => {
                warn!("dialog target {}: click failed: {}", target, e);
                report.failed.push(target.to_string());
            }
        }
    }

    report
}
