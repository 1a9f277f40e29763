use crate::browser::chrome::ChromePage;
use crate::browser::config::LaunchOptions;
use crate::browser::page::Page;
use crate::error::{BrowserError, Result};
use async_trait::async_trait;
use headless_chrome::Browser;
use std::{ffi::OsStr, time::Duration};

/// Creates one isolated browser session per scrape call
#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: Session;

    async fn acquire(&self) -> Result<Self::Session>;
}

/// One browser session with exactly one page.
///
/// Dropping a session without calling [`Session::release`] must still tear
/// the browser down.
#[async_trait]
pub trait Session: Send + Sync {
    fn page(&self) -> &dyn Page;

    async fn release(self) -> Result<()>;
}

/// Launches a fresh Chrome process, with a fresh temporary profile, per session
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    options: LaunchOptions,
    default_timeout: Duration,
}

impl ChromeLauncher {
    /// `default_timeout` bounds every blocking driver call, navigation included
    pub fn new(options: LaunchOptions, default_timeout: Duration) -> Self {
        Self { options, default_timeout }
    }

    fn launch_blocking(options: LaunchOptions, default_timeout: Duration) -> Result<BrowserSession> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Outlive the slowest stage so the browser is not reaped mid-scrape
        launch_opts.idle_browser_timeout = default_timeout.saturating_mul(4).max(Duration::from_secs(120));

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;
        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        let browser = Browser::new(launch_opts).map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .wait_for_initial_tab()
            .map_err(|e| BrowserError::LaunchFailed(format!("Failed to get initial tab: {}", e)))?;
        tab.set_default_timeout(default_timeout);

        Ok(BrowserSession {
            browser: Some(browser),
            page: ChromePage::new(tab),
        })
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    type Session = BrowserSession;

    async fn acquire(&self) -> Result<BrowserSession> {
        let options = self.options.clone();
        let default_timeout = self.default_timeout;

        tokio::task::spawn_blocking(move || Self::launch_blocking(options, default_timeout))
            .await
            .map_err(|e| BrowserError::TaskAborted(e.to_string()))?
    }
}

/// Browser session that owns a Chrome/Chromium instance and its single tab
pub struct BrowserSession {
    /// `None` once released
    browser: Option<Browser>,

    page: ChromePage,
}

impl BrowserSession {
    /// Get the underlying Browser instance
    pub fn browser(&self) -> Option<&Browser> {
        self.browser.as_ref()
    }
}

#[async_trait]
impl Session for BrowserSession {
    fn page(&self) -> &dyn Page {
        &self.page
    }

    async fn release(mut self) -> Result<()> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let tab = self.page.tab().clone();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab: {}", e);
            }
            // Dropping the Browser kills the Chrome process
            drop(browser);
        })
        .await
        .map_err(|e| BrowserError::TaskAborted(e.to_string()))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let Some(browser) = self.browser.take() else {
            return;
        };
        log::warn!("Browser session dropped without release; terminating Chrome process");

        // Killing and reaping Chrome blocks, keep it off runtime workers
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || drop(browser));
            }
            Err(_) => drop(browser),
        }
    }
}
