//! Steady-rate request throttling shared by every fetch path.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::sync::Mutex;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Smoothed rate limiter admitting callers one at a time, in call order.
///
/// Permits are spaced `window / limit` apart with a burst of one, so the
/// upstream never sees more than `limit` requests in any `window`. The
/// admission lock is a fair (FIFO) tokio mutex.
#[derive(Clone)]
pub struct ThrottlingQueue {
    limiter: Arc<DirectRateLimiter>,
    admission: Arc<Mutex<()>>,
    period: Duration,
}

impl ThrottlingQueue {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let period = period_from_window(quota_window, quota_limit);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            admission: Arc::new(Mutex::new(())),
            period,
        }
    }

    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(Duration::from_secs(60), requests_per_minute)
    }

    /// Waits until a permit is available. Never fails.
    pub async fn acquire(&self) {
        let _turn = self.admission.lock().await;
        self.limiter.until_ready().await;
    }

    /// Minimum spacing between two admitted requests.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl std::fmt::Debug for ThrottlingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottlingQueue")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

fn period_from_window(quota_window: Duration, quota_limit: u32) -> Duration {
    let safe_limit = u128::from(quota_limit.max(1));
    let nanos_per_cell = u64::try_from(quota_window.as_nanos() / safe_limit).unwrap_or(u64::MAX);
    Duration::from_nanos(nanos_per_cell).max(Duration::from_millis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn period_spreads_quota_over_window() {
        assert_eq!(ThrottlingQueue::per_minute(250).period(), Duration::from_millis(240));
        assert_eq!(ThrottlingQueue::per_minute(60).period(), Duration::from_secs(1));
    }

    #[test]
    fn zero_limit_falls_back_to_one_per_window() {
        let queue = ThrottlingQueue::new(Duration::from_secs(2), 0);
        assert_eq!(queue.period(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn first_permit_is_immediate_and_following_are_spaced() {
        let queue = ThrottlingQueue::new(Duration::from_secs(1), 20);
        let started = Instant::now();

        queue.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(40));

        for _ in 0..4 {
            queue.acquire().await;
        }
        // 5 permits at 50ms spacing need at least 4 periods.
        assert!(started.elapsed() >= Duration::from_millis(195));
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_same_budget() {
        let queue = ThrottlingQueue::new(Duration::from_secs(1), 20);
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move { queue.acquire().await }));
        }
        for handle in handles {
            handle.await.expect("task");
        }

        assert!(started.elapsed() >= Duration::from_millis(145));
    }

    #[tokio::test]
    async fn waiters_are_admitted_in_call_order() {
        let queue = ThrottlingQueue::new(Duration::from_secs(1), 50);
        let admitted = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for caller in 0..5 {
            let queue = queue.clone();
            let admitted = Arc::clone(&admitted);
            handles.push(tokio::spawn(async move {
                queue.acquire().await;
                admitted.lock().expect("lock").push(caller);
            }));
            // Let this caller reach the admission lock before the next one calls.
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        for handle in handles {
            handle.await.expect("task");
        }

        assert_eq!(*admitted.lock().expect("lock"), vec![0, 1, 2, 3, 4]);
    }
}
