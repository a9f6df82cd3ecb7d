pub mod pipeline;
pub mod tools;
pub mod transcribe;

pub use pipeline::MediaPipeline;
pub use tools::{MediaBackend, ToolBackend};
pub use transcribe::{transcribe_audio, SpeechEngine, WhisperCli, WhisperModel};
