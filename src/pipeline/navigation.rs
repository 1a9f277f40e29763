use crate::error::{ErrorKind, ScrapeError, StageId};
use crate::pipeline::StageContext;
use crate::wait::wait_for_settle;
use tokio::time::Instant;

fn failure(message: impl Into<String>) -> ScrapeError {
    ScrapeError::new(StageId::Navigation, ErrorKind::NavigationTimeout, message)
}

/// Load `url` and wait for client-side rendering to settle.
///
/// Load errors, a non-2xx main document and an exceeded deadline are all
/// fatal.
pub async fn load(cx: &StageContext<'_>, url: &str) -> Result<(), ScrapeError> {
    let deadline = cx.timeouts.navigation;
    let started = Instant::now();
    cx.info(StageId::Navigation, format!("Loading {}", url));

    match tokio::time::timeout(deadline, cx.page.goto(url)).await {
        Err(_) => return Err(failure(format!("page load exceeded {}ms", deadline.as_millis()))),
        Ok(Err(e)) => return Err(failure(e.to_string())),
        Ok(Ok(())) => {}
    }

    let remaining = deadline.saturating_sub(started.elapsed());
    let settled = wait_for_settle(cx.page, cx.policy(remaining), cx.timeouts.settle_quiet).await;
    if !settled.is_satisfied() {
        return Err(failure(format!(
            "page did not settle within {}ms",
            deadline.as_millis()
        )));
    }

    if let Ok(state) = cx.page.load_state().await {
        if !state.is_success() {
            let status = state.status.unwrap_or_default();
            return Err(failure(format!("page load returned HTTP {}", status)));
        }
    }

    cx.info(
        StageId::Navigation,
        format!("Page settled after {}ms", started.elapsed().as_millis()),
    );
    Ok(())
}
