//! Client-side call cap and the backoff schedule used when it is hit.

use std::time::{Duration, Instant};

use crate::error::EtlError;

/// Allows at most `max_calls` per fixed window of `period`.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: u32,
    period: Duration,
    window_start: Option<Instant>,
    calls_in_window: u32,
}

impl RateLimiter {
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls,
            period,
            window_start: None,
            calls_in_window: 0,
        }
    }

    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    /// Count a call made at `now`. Returns the time left in the current window
    /// when the cap has already been reached.
    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), Duration> {
        let start = match self.window_start {
            Some(start) if now.duration_since(start) < self.period => start,
            _ => {
                self.window_start = Some(now);
                self.calls_in_window = 0;
                now
            }
        };

        if self.calls_in_window >= self.max_calls {
            return Err(self.period - now.duration_since(start));
        }
        self.calls_in_window += 1;
        Ok(())
    }
}

/// Exponential backoff: `initial * 2^attempt`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub initial: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            max_retries: 8,
        }
    }
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max_delay)
    }

    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// How long to wait before retrying after `attempt` failed tries, or
    /// `RateLimited` once the ceiling is reached. A `hint` (the limiter's
    /// remaining window or a server `Retry-After`) longer than the schedule wins.
    pub fn next_delay(&self, attempt: u32, hint: Option<Duration>) -> crate::error::Result<Duration> {
        if !self.can_retry(attempt) {
            return Err(EtlError::RateLimited { attempts: attempt });
        }
        Ok(self.delay(attempt).max(hint.unwrap_or_default()))
    }
}
