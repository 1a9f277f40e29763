use crate::dom::Target;
use crate::error::{ErrorKind, StageId};
use crate::pipeline::StageContext;
use crate::wait::{wait_for_element, wait_for_settle};
use rand::Rng;

/// Terminal state of the guest-join stage.
///
/// `Unjoined → Joining → Joined` when the form is present,
/// `Unjoined → AlreadyJoined` when it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { display_name: String },
    AlreadyJoined,
    /// The form was present but could not be submitted
    Abandoned { reason: String },
}

/// `<prefix><4-digit suffix>`, distinct per call
pub fn guest_name(prefix: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("{}{}", prefix, suffix)
}

/// Join the group order anonymously if the page asks for a name.
///
/// Never fails the pipeline: absence of the form means the session has
/// already joined, and a broken form is logged and left to view activation.
pub async fn join_as_guest(cx: &StageContext<'_>, bot_prefix: &str) -> JoinOutcome {
    let input = cx.locate(Target::JoinInput);
    let probe = wait_for_element(cx.page, &input, cx.policy(cx.timeouts.join_probe)).await;
    if !probe.is_satisfied() {
        cx.info(StageId::GuestJoin, "No guest join form detected or already joined");
        return JoinOutcome::AlreadyJoined;
    }

    let display_name = guest_name(bot_prefix);
    cx.info(StageId::GuestJoin, format!("Joining as guest {}", display_name));

    if let Err(e) = cx.page.fill(&input, &display_name).await {
        return abandon(cx, format!("could not fill join input: {}", e));
    }
    if let Err(e) = cx.page.click(&cx.locate(Target::JoinButton)).await {
        return abandon(cx, format!("could not submit join form: {}", e));
    }

    let settled = wait_for_settle(cx.page, cx.policy(cx.timeouts.settle), cx.timeouts.settle_quiet).await;
    if !settled.is_satisfied() {
        cx.info(StageId::GuestJoin, "Page still loading after join; continuing");
    }

    cx.info(StageId::GuestJoin, format!("Joined as guest with name: {}", display_name));
    JoinOutcome::Joined { display_name }
}

fn abandon(cx: &StageContext<'_>, reason: String) -> JoinOutcome {
    cx.recovered(StageId::GuestJoin, ErrorKind::ElementNotFound, reason.clone());
    JoinOutcome::Abandoned { reason }
}
