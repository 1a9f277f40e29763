//! Scripted in-memory page and launcher for driving the pipeline without Chrome.
//!
//! The fake page does not evaluate CSS. It answers by the locator's logical
//! target, which is all the stages ever ask about.

#![allow(dead_code)]

use async_trait::async_trait;
use group_cart::browser::{Launcher, LoadState, Page, Session};
use group_cart::{BrowserError, Locator, Result, Target};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// One row of the "Others in your group" list
#[derive(Debug, Clone)]
pub struct FakeParticipant {
    pub name: String,
    /// `(name, price text)` pairs rendered once expanded
    pub items: Vec<(String, String)>,
    pub has_expand_button: bool,
    /// When false, clicking the expand control never renders anything
    pub expands: bool,
}

impl FakeParticipant {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
            has_expand_button: true,
            expands: true,
        }
    }

    pub fn item(mut self, name: &str, price: &str) -> Self {
        self.items.push((name.to_string(), price.to_string()));
        self
    }

    pub fn without_expand_button(mut self) -> Self {
        self.has_expand_button = false;
        self
    }

    pub fn never_expands(mut self) -> Self {
        self.expands = false;
        self
    }

    fn collapsed_markup(&self) -> String {
        format!(
            r#"<div class="bo bp co dy">{}</div><button class="bh al ci dq" aria-expanded="false">more</button>"#,
            self.name
        )
    }

    fn expanded_markup(&self) -> String {
        let entries: String = self
            .items
            .iter()
            .map(|(name, price)| {
                format!(
                    r#"<a href="/item"><div class="bo bp co dy b1">{}</div><div class="cy bo bp bq br jf">{}</div></a>"#,
                    name, price
                )
            })
            .collect();
        format!(
            r#"<div class="bo bp co dy">{}</div><button class="bh al ci dq" aria-expanded="true">less</button><ul>{}</ul>"#,
            self.name, entries
        )
    }
}

/// What the order page looks like when a session opens it
#[derive(Debug, Clone)]
pub struct Scenario {
    pub restaurant: Option<String>,
    pub join_form: bool,
    pub view_link: bool,
    pub participants: Vec<FakeParticipant>,
    /// `goto` never completes
    pub hang_on_goto: bool,
    /// `document.readyState` never reaches `complete`
    pub never_ready: bool,
    pub status: Option<u16>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            restaurant: Some("Burger Barn".to_string()),
            join_form: true,
            view_link: true,
            participants: vec![
                FakeParticipant::new("GroupCartBot1234"),
                FakeParticipant::new("Alex").item("Burger", "$8.50").item("Fries", "$3.25"),
            ],
            hang_on_goto: false,
            never_ready: false,
            status: Some(200),
        }
    }
}

impl Scenario {
    pub fn page(&self) -> FakePage {
        FakePage::new(self.clone())
    }
}

#[derive(Debug, Default)]
struct PageState {
    url: Option<String>,
    join_form: bool,
    guest_name: Option<String>,
    submissions: usize,
    summary_visible: bool,
    expanded: Vec<bool>,
    expand_clicks: usize,
    expansion_probes: usize,
}

pub struct FakePage {
    scenario: Scenario,
    state: Mutex<PageState>,
}

impl FakePage {
    pub fn new(scenario: Scenario) -> Self {
        let state = PageState {
            join_form: scenario.join_form,
            expanded: vec![false; scenario.participants.len()],
            ..PageState::default()
        };
        Self {
            scenario,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }

    pub fn submissions(&self) -> usize {
        self.state().submissions
    }

    pub fn guest_name(&self) -> Option<String> {
        self.state().guest_name.clone()
    }

    pub fn expand_clicks(&self) -> usize {
        self.state().expand_clicks
    }

    pub fn expansion_probes(&self) -> usize {
        self.state().expansion_probes
    }

    /// Row index addressed by a participant-row locator or one nested in it
    fn row_of(locator: &Locator) -> Option<usize> {
        if locator.target == Target::ParticipantRow {
            return Some(locator.nth);
        }
        locator.parent.as_deref().and_then(Self::row_of)
    }

    fn participant(&self, locator: &Locator) -> Option<(usize, &FakeParticipant)> {
        let row = Self::row_of(locator)?;
        self.scenario.participants.get(row).map(|p| (row, p))
    }

    fn matches(&self, locator: &Locator) -> usize {
        let mut state = self.state();
        match locator.target {
            Target::JoinInput | Target::JoinButton => usize::from(state.join_form),
            Target::ViewOrderLink => usize::from(self.scenario.view_link),
            Target::SummaryMarker => usize::from(state.summary_visible),
            Target::ParticipantsHeading => {
                usize::from(state.summary_visible && !self.scenario.participants.is_empty())
            }
            Target::ParticipantRow if state.summary_visible => self.scenario.participants.len(),
            Target::ParticipantExpandButton => match self.participant(locator) {
                Some((_, p)) if state.summary_visible && p.has_expand_button => 1,
                _ => 0,
            },
            Target::ExpandedContent => {
                state.expansion_probes += 1;
                match self.participant(locator) {
                    Some((row, p)) if state.expanded[row] && p.expands && !p.items.is_empty() => p.items.len(),
                    _ => 0,
                }
            }
            Target::RestaurantTitle => usize::from(self.scenario.restaurant.is_some()),
            _ => 0,
        }
    }

    fn not_found(locator: &Locator) -> BrowserError {
        BrowserError::ElementNotFound(locator.describe())
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        if self.scenario.hang_on_goto {
            std::future::pending::<()>().await;
        }
        self.state().url = Some(url.to_string());
        Ok(())
    }

    async fn load_state(&self) -> Result<LoadState> {
        let ready_state = if self.scenario.never_ready { "loading" } else { "complete" };
        Ok(LoadState {
            ready_state: ready_state.to_string(),
            resource_count: 12,
            status: self.scenario.status,
        })
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.matches(locator))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        Ok(self.matches(locator) > locator.nth)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        if self.matches(locator) <= locator.nth {
            return Err(Self::not_found(locator));
        }
        let mut state = self.state();
        match locator.target {
            Target::JoinButton => {
                state.submissions += 1;
                state.join_form = false;
            }
            Target::ViewOrderLink => state.summary_visible = true,
            Target::ParticipantExpandButton => {
                let row = Self::row_of(locator).ok_or_else(|| Self::not_found(locator))?;
                state.expand_clicks += 1;
                state.expanded[row] = true;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        if locator.target != Target::JoinInput || self.matches(locator) == 0 {
            return Err(Self::not_found(locator));
        }
        self.state().guest_name = Some(text.to_string());
        Ok(())
    }

    async fn scroll_into_view(&self, _locator: &Locator) -> Result<()> {
        Ok(())
    }

    async fn inner_html(&self, locator: &Locator) -> Result<Option<String>> {
        if locator.target != Target::ParticipantRow || !self.state().summary_visible {
            return Ok(None);
        }
        let Some((row, participant)) = self.participant(locator) else {
            return Ok(None);
        };
        let expanded = self.state().expanded[row] && participant.expands;
        Ok(Some(if expanded {
            participant.expanded_markup()
        } else {
            participant.collapsed_markup()
        }))
    }

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>> {
        match locator.target {
            Target::ParticipantRow if self.state().summary_visible => {
                Ok(self.participant(locator).map(|(_, p)| format!("{} more", p.name)))
            }
            Target::RestaurantTitle => Ok(self.scenario.restaurant.clone()),
            _ => Ok(None),
        }
    }

    async fn content(&self) -> Result<String> {
        let title = self
            .scenario
            .restaurant
            .as_deref()
            .map(|name| format!("<h1>{}</h1>", name))
            .unwrap_or_default();
        Ok(format!("<html><body>{}<main>order</main></body></html>", title))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// Session counters shared between a launcher and its sessions
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub live: AtomicUsize,
    pub peak: AtomicUsize,
}

impl SessionCounters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    page: FakePage,
    counters: Arc<SessionCounters>,
}

#[async_trait]
impl Session for FakeSession {
    fn page(&self) -> &dyn Page {
        &self.page
    }

    async fn release(self) -> Result<()> {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Hands out a fresh [`FakePage`] per session
pub struct FakeLauncher {
    scenario: Scenario,
    counters: Arc<SessionCounters>,
    fail: bool,
}

impl FakeLauncher {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            counters: Arc::new(SessionCounters::default()),
            fail: false,
        }
    }

    /// Every acquisition fails as if Chrome could not start
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Scenario::default())
        }
    }

    pub fn counters(&self) -> Arc<SessionCounters> {
        self.counters.clone()
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Session = FakeSession;

    async fn acquire(&self) -> Result<FakeSession> {
        if self.fail {
            return Err(BrowserError::LaunchFailed("no browser available".to_string()));
        }
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(live, Ordering::SeqCst);

        // Yield so concurrent scrapes interleave
        tokio::task::yield_now().await;

        Ok(FakeSession {
            page: self.scenario.page(),
            counters: self.counters.clone(),
        })
    }
}
