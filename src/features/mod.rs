pub mod capture;
pub mod capture_session;
pub mod content_probe;
pub mod dialogs;
pub mod playback;
