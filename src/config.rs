//! Pipeline configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Durations are written in milliseconds.

use crate::browser::LaunchOptions;
use crate::dom::SelectorCatalog;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Deadlines and retry bounds for each stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Initial load plus settle of the order page
    #[serde(with = "millis")]
    pub navigation: Duration,

    /// Settle deadline after an interaction (join submit)
    #[serde(with = "millis")]
    pub settle: Duration,

    /// How long resource loading must stay idle to count as settled
    #[serde(with = "millis")]
    pub settle_quiet: Duration,

    /// Presence probe for the guest-join form
    #[serde(with = "millis")]
    pub join_probe: Duration,

    #[serde(with = "millis")]
    pub view_control: Duration,

    /// Summary marker after clicking the view-order control
    #[serde(with = "millis")]
    pub view_marker: Duration,

    #[serde(with = "millis")]
    pub participants_heading: Duration,

    #[serde(with = "millis")]
    pub participant_rows: Duration,

    /// Visibility wait for the participant's expand control
    #[serde(with = "millis")]
    pub expand_control: Duration,

    /// Per-attempt wait for expanded content
    #[serde(with = "millis")]
    pub expansion_attempt: Duration,

    #[serde(with = "millis")]
    pub expansion_retry_delay: Duration,

    pub expansion_attempts: u32,

    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(60),
            settle: Duration::from_secs(10),
            settle_quiet: Duration::from_millis(500),
            join_probe: Duration::from_secs(5),
            view_control: Duration::from_secs(15),
            view_marker: Duration::from_secs(15),
            participants_heading: Duration::from_secs(15),
            participant_rows: Duration::from_secs(10),
            expand_control: Duration::from_secs(5),
            expansion_attempt: Duration::from_secs(4),
            expansion_retry_delay: Duration::from_secs(1),
            expansion_attempts: 5,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Which participant's items to extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantSelector {
    /// Zero-based row position in the participant list
    Position(usize),
    /// First row whose text contains this name, case-insensitive
    Name(String),
}

impl Default for ParticipantSelector {
    fn default() -> Self {
        ParticipantSelector::Position(1)
    }
}

/// Full configuration of a [`Scraper`](crate::Scraper)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub launch: LaunchOptions,
    pub timeouts: Timeouts,
    /// Entries replace the built-in queries per target
    pub selectors: SelectorCatalog,
    pub participant: ParticipantSelector,
    /// Guest display names are `<bot_prefix><1000-9999>`
    pub bot_prefix: String,
    /// Upper bound on concurrently open browser sessions
    pub max_sessions: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            launch: LaunchOptions::default(),
            timeouts: Timeouts::default(),
            selectors: SelectorCatalog::default(),
            participant: ParticipantSelector::default(),
            bot_prefix: "GroupCartBot".to_string(),
            max_sessions: 4,
        }
    }
}

impl ScrapeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))?;

        let invalid = config.selectors.invalid_selectors();
        if !invalid.is_empty() {
            let listed: Vec<String> = invalid
                .iter()
                .map(|(target, css)| format!("{} '{}'", target, css))
                .collect();
            anyhow::bail!("Invalid selectors in {}: {}", path.display(), listed.join(", "));
        }
        Ok(config)
    }

    /// Builder method: set browser launch options
    pub fn launch(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }

    /// Builder method: set stage timeouts
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builder method: set the selector catalog
    pub fn selectors(mut self, selectors: SelectorCatalog) -> Self {
        self.selectors = selectors;
        self
    }

    /// Builder method: choose the participant to extract
    pub fn participant(mut self, participant: ParticipantSelector) -> Self {
        self.participant = participant;
        self
    }

    /// Builder method: set the guest name prefix
    pub fn bot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bot_prefix = prefix.into();
        self
    }

    /// Builder method: bound concurrent sessions (at least one)
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
