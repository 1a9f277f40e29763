use crate::browser::page::{LoadState, Page};
use crate::dom::Locator;
use crate::error::{BrowserError, Result};
use async_trait::async_trait;
use headless_chrome::Tab;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Element marked by the `mark` operation of `locate.js`
const MARKED_ELEMENT: &str = "[data-group-cart-target]";

const LOAD_STATE_JS: &str = r#"
    (function() {
        const nav = performance.getEntriesByType('navigation')[0];
        return JSON.stringify({
            readyState: document.readyState,
            resourceCount: performance.getEntriesByType('resource').length,
            status: nav && nav.responseStatus ? nav.responseStatus : null
        });
    })()
"#;

/// [`Page`] backed by a headless_chrome tab.
///
/// headless_chrome is blocking, so every call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tab) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || f(&tab))
            .await
            .map_err(|e| BrowserError::TaskAborted(e.to_string()))?
    }

    async fn locate<T>(&self, locator: &Locator, op: &'static str) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let script = locator_script(locator, op)?;
        self.blocking(move |tab| evaluate_json(tab, &script)).await
    }

    /// Mark the element addressed by `locator`, then run `action` on it
    async fn with_element<F>(&self, locator: &Locator, action: F) -> Result<()>
    where
        F: FnOnce(&headless_chrome::Element<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        let script = locator_script(locator, "mark")?;
        let description = locator.describe();

        self.blocking(move |tab| {
            let marked: bool = evaluate_json(tab, &script)?;
            if !marked {
                return Err(BrowserError::ElementNotFound(description));
            }
            let element = tab
                .find_element(MARKED_ELEMENT)
                .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", description, e)))?;
            action(&element).map_err(|e| BrowserError::TabOperationFailed(format!("{}: {}", description, e)))
        })
        .await
    }
}

/// Build the `locate.js` invocation for one locator and operation
fn locator_script(locator: &Locator, op: &str) -> Result<String> {
    let locator_json = serde_json::to_string(locator)
        .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to encode locator: {}", e)))?;
    let op_json = serde_json::to_string(op)
        .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to encode operation: {}", e)))?;

    Ok(include_str!("locate.js")
        .replace("__LOCATOR__", &locator_json)
        .replace("__OP__", &op_json))
}

/// Evaluate a script that returns a JSON string and decode it
fn evaluate_json<T: DeserializeOwned>(tab: &Tab, script: &str) -> Result<T> {
    let result = tab
        .evaluate(script, false)
        .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))?;

    let value = result
        .value
        .ok_or_else(|| BrowserError::EvaluationFailed("No value returned from script".to_string()))?;

    let json_str: String = serde_json::from_value(value)
        .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to get JSON string: {}", e)))?;

    serde_json::from_str(&json_str)
        .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to parse script result: {}", e)))
}

#[async_trait]
impl Page for ChromePage {
    async fn goto(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.blocking(move |tab| {
            tab.navigate_to(&url)
                .map_err(|e| BrowserError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
            tab.wait_until_navigated()
                .map_err(|e| BrowserError::NavigationFailed(format!("Navigation timeout: {}", e)))?;
            Ok(())
        })
        .await
    }

    async fn load_state(&self) -> Result<LoadState> {
        self.blocking(|tab| evaluate_json(tab, LOAD_STATE_JS)).await
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.locate(locator, "count").await
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        self.locate(locator, "visible").await
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.with_element(locator, |element| element.click().map(|_| ())).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        let text = text.to_string();
        self.with_element(locator, move |element| element.type_into(&text).map(|_| ()))
            .await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        self.with_element(locator, |element| element.scroll_into_view().map(|_| ()))
            .await
    }

    async fn inner_html(&self, locator: &Locator) -> Result<Option<String>> {
        self.locate(locator, "html").await
    }

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>> {
        self.locate(locator, "text").await
    }

    async fn content(&self) -> Result<String> {
        self.blocking(|tab| {
            tab.get_content()
                .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to read page content: {}", e)))
        })
        .await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.blocking(|tab| {
            tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to capture screenshot: {}", e)))
        })
        .await
    }
}
