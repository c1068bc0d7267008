//! Bounded polling primitive.
//!
//! Every wait in this crate is a poll loop with an explicit interval and an
//! explicit deadline. Centralizing the loop keeps the timeout arithmetic in
//! one place and makes the waits testable under `tokio::time::pause`.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Interval and overall timeout for a polling wait.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between predicate evaluations.
    pub interval: Duration,
    /// Overall budget; the wait gives up once this has elapsed.
    pub timeout: Duration,
}

impl PollConfig {
    /// Creates a config from an interval and a timeout.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Polls `predicate` until it returns true or the budget is exhausted.
///
/// The predicate is evaluated immediately, then once per interval. Returns
/// whether the predicate became true; a timeout is not an error here because
/// most callers treat "still not there" as an ordinary outcome.
pub async fn wait_until<F, Fut>(config: PollConfig, mut predicate: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + config.timeout;
    loop {
        if predicate().await {
            return true;
        }
        if Instant::now() + config.interval > deadline {
            return false;
        }
        sleep(config.interval).await;
    }
}

/// Polls `probe` until it yields a value or the budget is exhausted.
pub async fn wait_for<F, Fut, T>(config: PollConfig, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + config.timeout;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        if Instant::now() + config.interval > deadline {
            return None;
        }
        sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_immediately_when_predicate_holds() {
        let config = PollConfig::new(Duration::from_millis(100), Duration::from_secs(5));
        assert!(wait_until(config, || async { true }).await);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_predicate_becomes_true() {
        let config = PollConfig::new(Duration::from_millis(100), Duration::from_secs(5));
        let count = Arc::new(AtomicU32::new(0));
        let probe = count.clone();
        let ok = wait_until(config, move || {
            let probe = probe.clone();
            async move { probe.fetch_add(1, Ordering::SeqCst) >= 3 }
        })
        .await;
        assert!(ok);
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_the_deadline() {
        let config = PollConfig::new(Duration::from_millis(100), Duration::from_millis(350));
        let count = Arc::new(AtomicU32::new(0));
        let probe = count.clone();
        let ok = wait_until(config, move || {
            let probe = probe.clone();
            async move {
                probe.fetch_add(1, Ordering::SeqCst);
                false
            }
        })
        .await;
        assert!(!ok);
        // Initial check plus one per interval inside the budget.
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_yields_the_probed_value() {
        let config = PollConfig::new(Duration::from_millis(50), Duration::from_secs(1));
        let count = Arc::new(AtomicU32::new(0));
        let probe = count.clone();
        let value = wait_for(config, move || {
            let probe = probe.clone();
            async move {
                let n = probe.fetch_add(1, Ordering::SeqCst);
                (n >= 2).then_some(n)
            }
        })
        .await;
        assert_eq!(value, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_times_out_to_none() {
        let config = PollConfig::new(Duration::from_millis(50), Duration::from_millis(120));
        let value: Option<u32> = wait_for(config, || async { None }).await;
        assert!(value.is_none());
    }
}
