//! Exponential backoff between retry attempts
//!
//! Attempt `n` (zero-based) that fails at the transport level is followed by
//! a sleep of `base_delay * 2^n`, except after the final attempt. Delays
//! too large for a `Duration` saturate at `Duration::MAX`.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Delay schedule for one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay: Duration,
    max_attempts: u32,
}

impl BackoffPolicy {
    /// Create a policy
    ///
    /// `max_attempts` counts every attempt including the first.
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Base delay
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Total attempts for one logical request
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given zero-based attempt fails
    ///
    /// Returns `None` after the final attempt.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts {
            return None;
        }

        if self.base_delay.is_zero() {
            return Some(Duration::ZERO);
        }

        let delay = 1u128
            .checked_shl(attempt)
            .and_then(|multiplier| self.base_delay.as_nanos().checked_mul(multiplier))
            .and_then(|nanos| {
                let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
                Some(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
            })
            .unwrap_or(Duration::MAX);
        Some(delay)
    }

    /// Full delay sequence, one entry per retry
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts)
            .map_while(|attempt| self.delay_after(attempt))
            .collect()
    }

    /// Sum of all delays in the schedule, saturating at `Duration::MAX`
    pub fn total_delay(&self) -> Duration {
        self.schedule()
            .into_iter()
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
