//! Retry policy for remote fetches.

use std::time::Duration;

/// Backoff strategy applied between fetch attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ retry)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(2),
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (0-based: the wait after the first
    /// failed attempt is `delay(0)`).
    pub fn delay(self, retry: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(retry.min(i32::MAX as u32) as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Bounded retry configuration for the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts per resource, including the first one.
    pub max_attempts: u32,
    /// The backoff strategy to use between attempts.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    /// Fixed delay between a bounded number of attempts.
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Exponential backoff with jitter, starting at `base`.
    pub fn exponential(base: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                base,
                factor: 2.0,
                max: Duration::from_secs(60),
                jitter: true,
            },
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt.saturating_sub(1))
    }
}
