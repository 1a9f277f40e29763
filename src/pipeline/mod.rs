//! Scrape pipeline
//!
//! One scrape runs these stages in order against a single fresh session:
//!
//! 1. [`navigation`]: load the order page and wait for it to settle
//! 2. [`join`]: join as a guest when the page asks for a name
//! 3. [`view`]: open the order summary
//! 4. [`expansion`]: expand the selected participant's entry
//! 5. item extraction from the captured markup ([`crate::dom::extract_items`])
//! 6. assembly into a [`CartResult`]
//!
//! Stages 1 and 3 are fatal on failure. Everything else reports to the
//! [`DiagnosticSink`] and lets the pipeline continue.

pub mod expansion;
pub mod join;
pub mod navigation;
pub mod view;

pub use expansion::{ParticipantScope, expand_participant};
pub use join::{JoinOutcome, guest_name, join_as_guest};

use crate::browser::{ChromeLauncher, Launcher, Page, Session};
use crate::config::{ScrapeConfig, Timeouts};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use crate::dom::{Locator, SelectorCatalog, Target, extract_items, restaurant_name};
use crate::error::{ErrorKind, ScrapeError, StageId};
use crate::model::CartResult;
use crate::wait::WaitPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Everything a stage needs from the running scrape
pub struct StageContext<'a> {
    pub page: &'a dyn Page,
    pub catalog: &'a SelectorCatalog,
    pub timeouts: &'a Timeouts,
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> StageContext<'a> {
    pub fn new(
        page: &'a dyn Page,
        catalog: &'a SelectorCatalog,
        timeouts: &'a Timeouts,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            page,
            catalog,
            timeouts,
            sink,
        }
    }

    /// Wait policy with the configured poll interval
    pub fn policy(&self, timeout: Duration) -> WaitPolicy {
        WaitPolicy::new(timeout, self.timeouts.poll_interval)
    }

    pub fn locate(&self, target: Target) -> Locator {
        self.catalog.locate(target)
    }

    pub fn info(&self, stage: StageId, message: impl Into<String>) {
        self.sink.emit(Diagnostic::info(stage, message));
    }

    pub fn recovered(&self, stage: StageId, kind: ErrorKind, message: impl Into<String>) {
        self.sink.emit(Diagnostic::recovered(stage, kind, message));
    }

    /// Report an error the stage is absorbing
    pub fn report(&self, error: &ScrapeError) {
        self.recovered(error.stage, error.kind, error.message.clone());
    }
}

/// Check that `url` is an absolute http(s) URL
pub fn validate_url(url: &str) -> Result<Url, ScrapeError> {
    let invalid = |message: String| ScrapeError::new(StageId::Pipeline, ErrorKind::InvalidUrl, message);

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(format!("'{}' is not a valid URL: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(parsed),
        "http" | "https" => Err(invalid(format!("'{}' has no host", url))),
        scheme => Err(invalid(format!("unsupported URL scheme '{}'", scheme))),
    }
}

/// Anything that can turn a group-order URL into a cart
#[async_trait]
pub trait CartScraper: Send + Sync {
    async fn scrape_cart(&self, url: &str) -> Result<CartResult, ScrapeError>;
}

/// Runs the pipeline, one isolated session per call.
///
/// Cheap to share behind an `Arc`; concurrent calls are bounded by
/// [`ScrapeConfig::max_sessions`].
pub struct Scraper<L: Launcher = ChromeLauncher> {
    launcher: L,
    config: ScrapeConfig,
    sink: Arc<dyn DiagnosticSink>,
    sessions: Arc<Semaphore>,
}

impl Scraper<ChromeLauncher> {
    /// Scraper backed by headless Chrome, logging through [`LogSink`]
    pub fn new(config: ScrapeConfig) -> Self {
        let launcher = ChromeLauncher::new(config.launch.clone(), config.timeouts.navigation);
        Self::with_launcher(launcher, config, Arc::new(LogSink::new()))
    }
}

impl<L: Launcher> Scraper<L> {
    pub fn with_launcher(launcher: L, config: ScrapeConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let sessions = Arc::new(Semaphore::new(config.max_sessions.max(1)));
        Self {
            launcher,
            config,
            sink,
            sessions,
        }
    }

    /// Builder method: replace the diagnostic sink
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrape the group order at `url`.
    ///
    /// Either the full cart or the first fatal error; never a partial cart.
    pub async fn scrape(&self, url: &str) -> Result<CartResult, ScrapeError> {
        let result = self.scrape_inner(url).await;
        match &result {
            Ok(cart) => self.sink.emit(Diagnostic::info(
                StageId::Pipeline,
                format!("Scraped {} item(s) from {}, total {}", cart.items().len(), cart.restaurant(), cart.total_price()),
            )),
            Err(error) => self.sink.emit(Diagnostic::fatal(error)),
        }
        result
    }

    /// [`Scraper::scrape`] bounded by an overall deadline. The session is torn
    /// down when the deadline cancels the scrape.
    pub async fn scrape_with_deadline(&self, url: &str, deadline: Duration) -> Result<CartResult, ScrapeError> {
        match tokio::time::timeout(deadline, self.scrape(url)).await {
            Ok(result) => result,
            Err(_) => {
                let error = ScrapeError::new(
                    StageId::Pipeline,
                    ErrorKind::DeadlineExceeded,
                    format!("scrape did not finish within {}ms", deadline.as_millis()),
                );
                self.sink.emit(Diagnostic::fatal(&error));
                Err(error)
            }
        }
    }

    async fn scrape_inner(&self, url: &str) -> Result<CartResult, ScrapeError> {
        let url = validate_url(url)?;

        let _permit = self.sessions.acquire().await.map_err(|e| {
            ScrapeError::new(StageId::Session, ErrorKind::SessionLaunchFailed, e.to_string())
        })?;

        let session = self
            .launcher
            .acquire()
            .await
            .map_err(|e| ScrapeError::new(StageId::Session, ErrorKind::SessionLaunchFailed, e.to_string()))?;

        let page = session.page();
        let result = self.run(page, url.as_str()).await;

        if let Err(e) = session.release().await {
            log::warn!("Failed to release browser session: {}", e);
        }
        result
    }

    async fn run(&self, page: &dyn Page, url: &str) -> Result<CartResult, ScrapeError> {
        let cx = StageContext::new(page, &self.config.selectors, &self.config.timeouts, self.sink.as_ref());

        navigation::load(&cx, url).await?;
        join_as_guest(&cx, &self.config.bot_prefix).await;
        view::activate(&cx).await?;

        let restaurant = read_restaurant(&cx).await;

        let items = match expand_participant(&cx, &self.config.participant).await {
            Some(scope) => {
                let extraction = extract_items(&scope.markup, cx.catalog, scope.person.as_deref());
                for skipped in &extraction.skipped {
                    cx.recovered(
                        StageId::ItemExtraction,
                        skipped.kind,
                        format!("item entry {} skipped: {}", skipped.index, skipped.reason),
                    );
                }
                cx.info(
                    StageId::ItemExtraction,
                    format!("Extracted {} item(s), skipped {}", extraction.items.len(), extraction.skipped.len()),
                );
                extraction.items
            }
            None => Vec::new(),
        };

        Ok(CartResult::assemble(restaurant.as_deref(), items))
    }
}

async fn read_restaurant(cx: &StageContext<'_>) -> Option<String> {
    let name = match cx.page.content().await {
        Ok(markup) => restaurant_name(&markup, cx.catalog),
        Err(e) => {
            log::debug!("Could not capture page markup: {}", e);
            None
        }
    };
    if name.is_none() {
        cx.recovered(StageId::Assembly, ErrorKind::ElementNotFound, "restaurant title not found");
    }
    name
}

#[async_trait]
impl<L> CartScraper for Scraper<L>
where
    L: Launcher,
{
    async fn scrape_cart(&self, url: &str) -> Result<CartResult, ScrapeError> {
        self.scrape(url).await
    }
}
