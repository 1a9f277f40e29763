use crate::diagnostics::Artifact;
use crate::dom::Target;
use crate::error::{ErrorKind, ScrapeError, StageId};
use crate::pipeline::StageContext;
use crate::wait::wait_for_element;

/// Open the order summary. Mandatory: any failure is fatal and leaves a page
/// snapshot with the diagnostic sink.
pub async fn activate(cx: &StageContext<'_>) -> Result<(), ScrapeError> {
    match click_through(cx).await {
        Ok(()) => {
            cx.info(StageId::ViewActivation, "Clicked 'View Order' and summary rendered");
            Ok(())
        }
        Err(message) => {
            capture_snapshot(cx, StageId::ViewActivation).await;
            Err(ScrapeError::new(StageId::ViewActivation, ErrorKind::ViewActivationFailed, message))
        }
    }
}

async fn click_through(cx: &StageContext<'_>) -> Result<(), String> {
    let link = cx.locate(Target::ViewOrderLink);
    if !wait_for_element(cx.page, &link, cx.policy(cx.timeouts.view_control)).await.is_satisfied() {
        return Err(format!(
            "view-order control did not appear within {}ms",
            cx.timeouts.view_control.as_millis()
        ));
    }

    cx.page
        .click(&link)
        .await
        .map_err(|e| format!("failed to click view-order control: {}", e))?;

    let marker = cx.locate(Target::SummaryMarker);
    if !wait_for_element(cx.page, &marker, cx.policy(cx.timeouts.view_marker)).await.is_satisfied() {
        return Err(format!(
            "order summary did not appear within {}ms of clicking",
            cx.timeouts.view_marker.as_millis()
        ));
    }
    Ok(())
}

/// Hand the current markup and a screenshot to the sink, best effort
pub(crate) async fn capture_snapshot(cx: &StageContext<'_>, stage: StageId) {
    let markup = cx.page.content().await.ok();
    let screenshot = cx.page.screenshot().await.ok();
    cx.sink.snapshot(Artifact {
        stage,
        markup,
        screenshot,
    });
}
