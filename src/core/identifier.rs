//! Content identifier extraction.
//!
//! Post URLs carry their short identifier in the path segment that follows a
//! marker (`/reel/<id>/`, `/reels/<id>/`, `/p/<id>/`). Everything written to
//! disk for a post is namespaced by that identifier, so the same URL must
//! always map to the same token.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Path segments that announce the identifier in the following segment.
pub const MARKER_SEGMENTS: &[&str] = &["reel", "reels", "p"];

/// Stable short token naming one post's artifacts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Timestamp token used when a URL carries no identifier.
    pub fn from_timestamp() -> Self {
        Self(chrono::Local::now().format("%Y%m%d%H%M%S").to_string())
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/(reel|reels|p)/([^/?#]+)").expect("valid marker regex"))
}

/// Path component of `url`, with query and fragment removed.
///
/// Falls back to treating the raw string as a path when it is not an
/// absolute URL (e.g. `instagram.com/reel/ABC`).
fn url_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url.trim()) {
        return parsed.path().to_string();
    }
    let raw = url.trim();
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    raw[..end].to_string()
}

/// A token is usable only as a single path component.
fn is_usable_token(token: &str) -> bool {
    !token.is_empty() && token != "." && token != ".." && !token.contains(['/', '\\'])
}

/// Extract the content identifier from a post URL.
///
/// Returns `None` when neither a marker segment nor the marker pattern is
/// present; callers pick a substitute (see [`content_id_or_timestamp`]).
pub fn extract_content_id(url: &str) -> Option<ContentIdentifier> {
    let path = url_path(url);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in segments.iter().enumerate() {
        if MARKER_SEGMENTS.contains(segment) {
            match segments.get(i + 1) {
                Some(next) if is_usable_token(next) => {
                    return Some(ContentIdentifier(next.to_string()));
                }
                _ => {}
            }
        }
    }

    marker_pattern()
        .captures(&path)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
        .filter(|token| is_usable_token(token))
        .map(|token| ContentIdentifier(token.to_string()))
}

/// Identifier for `url`, or a timestamp token when none can be derived.
pub fn content_id_or_timestamp(url: &str) -> ContentIdentifier {
    extract_content_id(url).unwrap_or_else(ContentIdentifier::from_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> Option<String> {
        extract_content_id(url).map(|c| c.as_str().to_string())
    }

    #[test]
    fn reel_url_with_trailing_slash() {
        assert_eq!(
            id("https://www.instagram.com/reel/ABC123/"),
            Some("ABC123".into())
        );
    }

    #[test]
    fn every_marker_is_recognised() {
        assert_eq!(id("https://site/reels/XyZ_9"), Some("XyZ_9".into()));
        assert_eq!(id("https://site/p/Cq1-2b/"), Some("Cq1-2b".into()));
        assert_eq!(id("https://site/user/reel/R1"), Some("R1".into()));
    }

    #[test]
    fn query_and_fragment_are_not_part_of_the_id() {
        assert_eq!(
            id("https://www.instagram.com/reel/ABC123/?igsh=MWx0&utm_source=ig"),
            Some("ABC123".into())
        );
        assert_eq!(id("https://site/p/QQQ#comments"), Some("QQQ".into()));
    }

    #[test]
    fn first_marker_wins() {
        assert_eq!(id("https://site/reel/FIRST/p/SECOND"), Some("FIRST".into()));
        assert_eq!(id("https://site/p/reel/X"), Some("reel".into()));
    }

    #[test]
    fn marker_without_following_segment_is_skipped() {
        assert_eq!(id("https://site/reel/"), None);
        assert_eq!(id("https://site/stories/reel"), None);
    }

    #[test]
    fn empty_segments_are_ignored() {
        assert_eq!(id("https://site//reel//ABC//"), Some("ABC".into()));
    }

    #[test]
    fn non_absolute_url_still_parses() {
        assert_eq!(id("instagram.com/reel/ABC?x=1"), Some("ABC".into()));
    }

    #[test]
    fn no_marker_returns_none() {
        assert_eq!(id("https://www.instagram.com/explore/tags/rust/"), None);
        assert_eq!(id("https://example.com/"), None);
        assert_eq!(id("not a url"), None);
    }

    #[test]
    fn dot_segments_never_become_ids() {
        assert_eq!(id("instagram.com/reel/../"), None);
        assert_eq!(id("instagram.com/reel/./"), None);
        assert_eq!(id("instagram.com/reel/../p/OK1"), Some("OK1".into()));
        assert_eq!(id(r"instagram.com/reel/a\b"), None);
    }

    #[test]
    fn dot_segment_falls_back_to_timestamp() {
        let fallback = content_id_or_timestamp("instagram.com/reel/../");
        assert!(fallback.as_str().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn extraction_is_deterministic() {
        let url = "https://www.instagram.com/reel/DET123/";
        assert_eq!(extract_content_id(url), extract_content_id(url));
    }

    #[test]
    fn timestamp_fallback_is_numeric() {
        let fallback = content_id_or_timestamp("https://example.com/");
        assert_eq!(fallback.as_str().len(), 14);
        assert!(fallback.as_str().chars().all(|c| c.is_ascii_digit()));
    }
}
