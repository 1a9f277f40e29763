use crate::config::ParticipantSelector;
use crate::dom::{Locator, Target, participant_name};
use crate::error::{ErrorKind, ScrapeError, StageId};
use crate::pipeline::StageContext;
use crate::wait::{RetryOutcome, WaitPolicy, retry_condition, wait_for_element, wait_for_settle, wait_for_visible};

/// Markup captured from one participant's entry, ready for item extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantScope {
    pub markup: String,
    /// Display name used as `person` on every extracted item
    pub person: Option<String>,
    /// False when expansion timed out and `markup` is whatever had rendered
    pub expanded: bool,
}

fn not_found(message: impl Into<String>) -> ScrapeError {
    ScrapeError::new(StageId::ParticipantExpansion, ErrorKind::ElementNotFound, message)
}

/// Locate and expand the selected participant's entry.
///
/// Returns `None` (nothing to extract) when the participant or its expand
/// control cannot be found. An expansion timeout is reported and the row's
/// current markup is still returned.
pub async fn expand_participant(cx: &StageContext<'_>, selector: &ParticipantSelector) -> Option<ParticipantScope> {
    let row = match find_participant_row(cx, selector).await {
        Ok(row) => row,
        Err(error) => {
            cx.report(&error);
            return None;
        }
    };

    let collapsed = cx.page.inner_html(&row).await.ok().flatten();
    let person = collapsed
        .as_deref()
        .and_then(|markup| participant_name(markup, cx.catalog))
        .or_else(|| match selector {
            ParticipantSelector::Name(name) => Some(name.clone()),
            ParticipantSelector::Position(_) => None,
        });

    let button = cx.locate(Target::ParticipantExpandButton).within(row.clone());
    if !wait_for_visible(cx.page, &button, cx.policy(cx.timeouts.expand_control)).await.is_satisfied() {
        cx.report(&not_found(format!("no expand control in {}", row.describe())));
        return None;
    }

    if let Err(e) = cx.page.scroll_into_view(&button).await {
        log::debug!("Could not scroll expand control into view: {}", e);
    }
    if let Err(e) = cx.page.click(&button).await {
        cx.report(&not_found(format!("failed to click expand control: {}", e)));
        return None;
    }

    let expanded = match await_expanded(cx, &row).await {
        Ok(attempt) => {
            cx.info(StageId::ParticipantExpansion, format!("Participant expanded on attempt {}", attempt));
            let settle = cx.policy(cx.timeouts.expansion_attempt);
            wait_for_settle(cx.page, settle, cx.timeouts.settle_quiet).await;
            true
        }
        Err(error) => {
            cx.report(&error);
            false
        }
    };

    match cx.page.inner_html(&row).await {
        Ok(Some(markup)) => Some(ParticipantScope { markup, person, expanded }),
        Ok(None) => {
            cx.report(&not_found(format!("{} disappeared after expanding", row.describe())));
            None
        }
        Err(e) => {
            cx.report(&not_found(format!("could not read {}: {}", row.describe(), e)));
            None
        }
    }
}

/// Wait for the participant list and pick the selected row
async fn find_participant_row(cx: &StageContext<'_>, selector: &ParticipantSelector) -> Result<Locator, ScrapeError> {
    let heading = cx.locate(Target::ParticipantsHeading);
    if !wait_for_element(cx.page, &heading, cx.policy(cx.timeouts.participants_heading)).await.is_satisfied() {
        return Err(not_found("participants heading did not appear"));
    }

    let rows = cx.locate(Target::ParticipantRow);
    if !wait_for_element(cx.page, &rows, cx.policy(cx.timeouts.participant_rows)).await.is_satisfied() {
        return Err(not_found("participant list did not populate"));
    }
    let count = cx
        .page
        .count(&rows)
        .await
        .map_err(|e| not_found(format!("could not count participants: {}", e)))?;

    match selector {
        ParticipantSelector::Position(position) if *position < count => Ok(rows.nth(*position)),
        ParticipantSelector::Position(position) => Err(not_found(format!(
            "participant at position {} requested but only {} listed",
            position, count
        ))),
        ParticipantSelector::Name(name) => {
            let needle = name.to_lowercase();
            for index in 0..count {
                let candidate = rows.clone().nth(index);
                let text = cx.page.inner_text(&candidate).await.ok().flatten().unwrap_or_default();
                if text.to_lowercase().contains(&needle) {
                    return Ok(candidate);
                }
            }
            Err(not_found(format!("no participant named '{}' among {} listed", name, count)))
        }
    }
}

/// Retry-wait for expanded content inside `row`, up to the configured number
/// of attempts. Returns the 1-based attempt that saw it.
pub async fn await_expanded(cx: &StageContext<'_>, row: &Locator) -> Result<u32, ScrapeError> {
    let content = cx.locate(Target::ExpandedContent).within(row.clone());
    let per_attempt: WaitPolicy = cx.policy(cx.timeouts.expansion_attempt);
    let page = cx.page;
    let content = &content;

    let outcome = retry_condition(
        cx.timeouts.expansion_attempts,
        per_attempt,
        cx.timeouts.expansion_retry_delay,
        move || async move { page.count(content).await.map(|n| n > 0).unwrap_or(false) },
    )
    .await;

    match outcome {
        RetryOutcome::Satisfied { attempt } => Ok(attempt),
        RetryOutcome::Exhausted { attempts } => Err(ScrapeError::new(
            StageId::ParticipantExpansion,
            ErrorKind::ExpansionTimeout,
            format!("expanded content did not render after {} attempts", attempts),
        )),
    }
}
