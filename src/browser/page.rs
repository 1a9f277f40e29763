use crate::dom::Locator;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Document load progress sampled from the live page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadState {
    /// `document.readyState`
    pub ready_state: String,

    /// Number of sub-resources fetched so far
    pub resource_count: usize,

    /// HTTP status of the main document, when the browser reports it
    #[serde(default)]
    pub status: Option<u16>,
}

impl LoadState {
    pub fn is_complete(&self) -> bool {
        self.ready_state == "complete"
    }

    /// True unless the main document reported a non-2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_none_or(|status| (200..300).contains(&status))
    }
}

/// The single page of a browser session, as seen by the pipeline stages.
///
/// Every element operation takes a [`Locator`]; an unresolved locator yields
/// `Ok(0)`/`Ok(false)`/`Ok(None)` for queries and
/// [`BrowserError::ElementNotFound`](crate::BrowserError::ElementNotFound) for actions.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait for the main frame to finish loading
    async fn goto(&self, url: &str) -> Result<()>;

    async fn load_state(&self) -> Result<LoadState>;

    /// Number of matches for the locator's winning query
    async fn count(&self, locator: &Locator) -> Result<usize>;

    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Focus the element and type `text` into it
    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()>;

    async fn inner_html(&self, locator: &Locator) -> Result<Option<String>>;

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>>;

    /// Full rendered markup of the page
    async fn content(&self) -> Result<String>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_state_deserialization() {
        let json = r#"{"readyState": "complete", "resourceCount": 12, "status": 200}"#;
        let state: LoadState = serde_json::from_str(json).unwrap();
        assert!(state.is_complete());
        assert!(state.is_success());
        assert_eq!(state.resource_count, 12);
    }

    #[test]
    fn test_load_state_status() {
        let state = LoadState {
            ready_state: "interactive".to_string(),
            resource_count: 0,
            status: Some(404),
        };
        assert!(!state.is_complete());
        assert!(!state.is_success());

        let unknown = LoadState { status: None, ..state };
        assert!(unknown.is_success());
    }
}
