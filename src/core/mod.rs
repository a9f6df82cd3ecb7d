pub mod config;
pub mod identifier;
pub mod types;

pub use identifier::{content_id_or_timestamp, extract_content_id, ContentIdentifier};
