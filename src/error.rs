use std::fmt;
use thiserror::Error;

/// Errors raised by the browser driver layer
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Chrome could not be started
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Page load or navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// A locator did not resolve to an element
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// JavaScript evaluation failed or returned something unexpected
    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    /// Tab-level operation (create, close, screenshot) failed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// A blocking driver call could not be joined
    #[error("Browser task aborted: {0}")]
    TaskAborted(String),
}

/// Result alias for driver-level operations
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Pipeline stage identity, attached to every failure and diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Session,
    Navigation,
    GuestJoin,
    ViewActivation,
    ParticipantExpansion,
    ItemExtraction,
    Assembly,
    Pipeline,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Session => "session",
            StageId::Navigation => "navigation",
            StageId::GuestJoin => "guest_join",
            StageId::ViewActivation => "view_activation",
            StageId::ParticipantExpansion => "participant_expansion",
            StageId::ItemExtraction => "item_extraction",
            StageId::Assembly => "assembly",
            StageId::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of pipeline failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Page load or settle deadline exceeded, or the load was not a 2xx
    NavigationTimeout,
    /// The view-order control or the summary marker never appeared
    ViewActivationFailed,
    /// Expanded participant content did not render within the retry bound
    ExpansionTimeout,
    /// An optional element was missing
    ElementNotFound,
    /// Text did not match the expected pattern
    ParseError,
    /// The input URL is not an absolute http(s) URL
    InvalidUrl,
    /// The browser session could not be acquired
    SessionLaunchFailed,
    /// The caller-level deadline elapsed
    DeadlineExceeded,
}

impl ErrorKind {
    /// Fatal kinds abort the scrape; all others degrade the result.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ErrorKind::ExpansionTimeout | ErrorKind::ElementNotFound | ErrorKind::ParseError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NavigationTimeout => "NavigationTimeout",
            ErrorKind::ViewActivationFailed => "ViewActivationFailed",
            ErrorKind::ExpansionTimeout => "ExpansionTimeout",
            ErrorKind::ElementNotFound => "ElementNotFound",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::InvalidUrl => "InvalidUrl",
            ErrorKind::SessionLaunchFailed => "SessionLaunchFailed",
            ErrorKind::DeadlineExceeded => "DeadlineExceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage-scoped failure. Only fatal kinds ever reach the caller of
/// [`Scraper::scrape`](crate::Scraper::scrape).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} during {stage}: {message}")]
pub struct ScrapeError {
    pub stage: StageId,
    pub kind: ErrorKind,
    pub message: String,
}

impl ScrapeError {
    pub fn new(stage: StageId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}
