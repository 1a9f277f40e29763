//! # group-cart
//!
//! Extracts the cart of a shared group food order (restaurant, items, prices and
//! the participant who added them) by driving headless Chrome through the
//! Chrome DevTools Protocol.
//!
//! ## Features
//!
//! - **Scrape Pipeline**: navigation, guest join, order view, participant expansion and
//!   item extraction, each bounded by its own deadline
//! - **Selector Catalog**: every page selector lives in one ordered, overridable table
//! - **Snapshot Parsing**: items are parsed from captured markup, never from the live DOM
//! - **Diagnostics**: stages report to an injected sink; fatal failures leave a page snapshot
//! - **HTTP Service**: `POST /scrape` and `GET /health` (requires `server` feature)
//!
//! ## Command Line
//!
//! ```bash
//! # Scrape a group order, headless
//! cargo run --bin group-cart -- https://www.ubereats.com/group-orders/<id>/join
//!
//! # Watch the browser and keep failure snapshots
//! cargo run --bin group-cart -- --headed --artifact-dir ./debug <URL>
//!
//! # Serve the HTTP API
//! cargo run --features server --bin group-cart-server -- --port 8000
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use group_cart::{ScrapeConfig, Scraper};
//!
//! # async fn run() -> Result<(), group_cart::ScrapeError> {
//! let scraper = Scraper::new(ScrapeConfig::default());
//! let cart = scraper.scrape("https://www.ubereats.com/group-orders/abc/join").await?;
//!
//! println!("{}: {} item(s), total {}", cart.restaurant(), cart.items().len(), cart.total_price());
//! # Ok(())
//! # }
//! ```
//!
//! ### Choosing a Participant
//!
//! ```rust,no_run
//! use group_cart::{ParticipantSelector, ScrapeConfig, Scraper};
//!
//! let config = ScrapeConfig::default().participant(ParticipantSelector::Name("Jordan".into()));
//! let scraper = Scraper::new(config);
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: Page abstraction, session launch and teardown over headless_chrome
//! - [`dom`]: Selector catalog and markup parsers
//! - [`pipeline`]: The scrape stages and the [`Scraper`] that runs them
//! - [`wait`]: Deadline-bounded polling
//! - [`diagnostics`]: Diagnostic sinks
//! - [`config`]: Timeouts, participant selection, launch options
//! - [`model`]: Cart records
//! - [`error`]: Error types and result aliases
//! - [`server`]: HTTP routes (requires `server` feature)

pub mod browser;
pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod wait;

#[cfg(feature = "server")]
pub mod server;

pub use browser::{BrowserSession, ChromeLauncher, LaunchOptions, Launcher, Page, Session};
pub use config::{ParticipantSelector, ScrapeConfig, Timeouts};
pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink, MemorySink};
pub use dom::{Locator, Query, SelectorCatalog, Target};
pub use error::{BrowserError, ErrorKind, Result, ScrapeError, StageId};
pub use model::{CartItem, CartResult, Money};
pub use pipeline::{CartScraper, Scraper, validate_url};
