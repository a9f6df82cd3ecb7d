pub mod browser_manager;
pub mod page;
pub mod stealth;

pub use browser_manager::BrowserSession;
pub use page::{Locator, PageDriver};
