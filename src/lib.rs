pub mod core;
pub mod features;
pub mod media;
pub mod scraping;
pub mod setup;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::{content_id_or_timestamp, extract_content_id, ContentIdentifier};

pub use features::capture::{capture_reel, CaptureError, CaptureLoop};
pub use media::{MediaPipeline, ToolBackend, WhisperCli, WhisperModel};
pub use scraping::{BrowserSession, Locator, PageDriver};
