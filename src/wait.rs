//! Deadline-bounded polling of live page state
//!
//! Every wait in the pipeline goes through [`poll_until`]: probe, check, sleep
//! one poll interval, repeat until the deadline. Waits never error; they report
//! [`WaitOutcome::TimedOut`] and the calling stage decides whether that is fatal.

use crate::browser::{LoadState, Page};
use crate::dom::Locator;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Lower bound on the poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

impl WaitOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, WaitOutcome::Satisfied)
    }
}

/// Deadline and polling cadence for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }
}

/// Result of [`retry_condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The condition held during the given 1-based attempt
    Satisfied { attempt: u32 },
    /// Every attempt timed out
    Exhausted { attempts: u32 },
}

/// Probe repeatedly until `accept` returns true for a probed value or the
/// deadline passes. The probe always runs at least once, and a probe still
/// pending at the deadline is abandoned.
pub async fn poll_until<T, F, Fut, A>(policy: WaitPolicy, mut probe: F, mut accept: A) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    A: FnMut(T) -> bool,
{
    let deadline = Instant::now() + policy.timeout;
    let interval = policy.poll_interval.max(MIN_POLL_INTERVAL);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, probe()).await {
            Ok(value) => {
                if accept(value) {
                    return WaitOutcome::Satisfied;
                }
            }
            Err(_) => log::debug!("Probe still pending at deadline"),
        }
        if Instant::now() >= deadline {
            return WaitOutcome::TimedOut;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Wait until `predicate` resolves to true
pub async fn await_condition<F, Fut>(policy: WaitPolicy, predicate: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(policy, predicate, |satisfied| satisfied).await
}

/// Run up to `attempts` waits of `per_attempt` each, sleeping `delay` between
/// attempts.
pub async fn retry_condition<F, Fut>(
    attempts: u32,
    per_attempt: WaitPolicy,
    delay: Duration,
    mut predicate: F,
) -> RetryOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        if await_condition(per_attempt, &mut predicate).await.is_satisfied() {
            return RetryOutcome::Satisfied { attempt };
        }
        log::debug!("Condition not met on attempt {}/{}", attempt, attempts);
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    RetryOutcome::Exhausted { attempts }
}

/// Wait until `locator` matches at least one element. Driver errors count as
/// "not yet".
pub async fn wait_for_element(page: &dyn Page, locator: &Locator, policy: WaitPolicy) -> WaitOutcome {
    await_condition(policy, move || async move { page.count(locator).await.map(|n| n > 0).unwrap_or(false) })
        .await
}

/// Wait until the element addressed by `locator` is rendered with a size
pub async fn wait_for_visible(page: &dyn Page, locator: &Locator, policy: WaitPolicy) -> WaitOutcome {
    await_condition(policy, move || async move { page.is_visible(locator).await.unwrap_or(false) }).await
}

/// Wait for client-side rendering to settle: the document has finished loading
/// and no new resources were fetched for at least `quiet`.
pub async fn wait_for_settle(page: &dyn Page, policy: WaitPolicy, quiet: Duration) -> WaitOutcome {
    let mut last: Option<(usize, Instant)> = None;

    poll_until(
        policy,
        move || async move { page.load_state().await.ok() },
        |state: Option<LoadState>| {
            let Some(state) = state else {
                last = None;
                return false;
            };
            if !state.is_complete() {
                last = None;
                return false;
            }

            let now = Instant::now();
            match last {
                Some((count, since)) if count == state.resource_count => now.duration_since(since) >= quiet,
                _ => {
                    last = Some((state.resource_count, now));
                    quiet.is_zero()
                }
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(timeout_ms: u64, poll_ms: u64) -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(timeout_ms), Duration::from_millis(poll_ms))
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_immediately() {
        let start = Instant::now();
        let outcome = await_condition(policy(1000, 100), || async { true }).await;
        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_spinning() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = Instant::now();

        let outcome = await_condition(policy(1000, 100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        // t = 0, 100, ..., 1000
        assert_eq!(calls.load(Ordering::SeqCst), 11);
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_probes_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let outcome = await_condition(policy(0, 100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_after_some_polls() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let outcome = await_condition(policy(5000, 250), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { n >= 3 }
        })
        .await;
        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_respects_deadline() {
        let start = Instant::now();
        let outcome = await_condition(policy(5000, 100), std::future::pending::<bool>).await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_cut_at_deadline() {
        let start = Instant::now();
        let outcome = await_condition(policy(1000, 100), || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            true
        })
        .await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_hanging_probe() {
        let start = Instant::now();
        let outcome =
            retry_condition(5, policy(4000, 100), Duration::from_secs(1), std::future::pending::<bool>).await;

        assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 5 });
        assert_eq!(start.elapsed(), Duration::from_secs(24));
    }

    #[test]
    fn test_poll_interval_floor() {
        assert_eq!(WaitPolicy::new(Duration::from_secs(1), Duration::ZERO).poll_interval, MIN_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_five_attempts() {
        let start = Instant::now();
        let outcome = retry_condition(5, policy(4000, 100), Duration::from_secs(1), || async { false }).await;

        assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 5 });
        // five 4s waits and four 1s pauses
        assert!(start.elapsed() >= Duration::from_secs(24));
        assert!(start.elapsed() < Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_reports_succeeding_attempt() {
        let start = Instant::now();
        let outcome = retry_condition(5, policy(1000, 100), Duration::from_secs(1), move || {
            let elapsed = start.elapsed();
            async move { elapsed >= Duration::from_millis(2500) }
        })
        .await;
        // attempt 1: 0-1s, pause to 2s, attempt 2: 2-3s succeeds at 2.5s
        assert_eq!(outcome, RetryOutcome::Satisfied { attempt: 2 });
    }
}
