//! Selector catalog and markup-snapshot parsing
//!
//! This module holds everything that knows about the order page's structure:
//! - SelectorCatalog: logical targets mapped to ordered fallback queries
//! - Locator: live-page address built from catalog entries
//! - extract: pure parsers that turn captured markup into cart records
//!
//! Nothing here talks to a browser; the parsers work on markup strings so they
//! can be tested against fixtures.

pub mod catalog;
pub mod extract;

pub use catalog::{Locator, Query, SelectorCatalog, Target};
pub use extract::{Extraction, SkippedEntry, extract_items, parse_price, participant_name, restaurant_name};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_export() {
        let catalog = SelectorCatalog::default();
        assert!(!catalog.queries(Target::ItemEntry).is_empty());
    }

    #[test]
    fn test_extract_export() {
        let extraction = extract_items("", &SelectorCatalog::default(), None);
        assert!(extraction.items.is_empty());
    }
}
