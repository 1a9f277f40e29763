//! Browser session control
//!
//! - [`Page`]: the async surface the pipeline stages drive
//! - [`Launcher`] / [`Session`]: per-scrape acquisition and teardown
//! - [`ChromeLauncher`] / [`BrowserSession`] / [`ChromePage`]: the headless_chrome backing

pub mod chrome;
pub mod config;
pub mod page;
pub mod session;

pub use chrome::ChromePage;
pub use config::LaunchOptions;
pub use page::{LoadState, Page};
pub use session::{BrowserSession, ChromeLauncher, Launcher, Session};
