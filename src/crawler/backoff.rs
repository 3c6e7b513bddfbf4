//! Exponential pause policy for starved queues

use crate::config::BackoffConfig;
use std::time::Duration;

/// Pause policy applied when a queue hands out no item
///
/// The `k`-th consecutive pause lasts `min(base * 2^k, max)`. Any
/// successful dequeue resets `k` to zero.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    pauses: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            pauses: 0,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.base(), config.max())
    }

    /// Length of the pause after `k` consecutive empty dequeues
    pub fn delay_for(&self, k: u32) -> Duration {
        let factor = 2u32.saturating_pow(k.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Returns the next pause length and counts it
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.pauses);
        self.pauses = self.pauses.saturating_add(1);
        delay
    }

    /// Forgets earlier pauses after a successful dequeue
    pub fn reset(&mut self) {
        self.pauses = 0;
    }

    /// Number of consecutive pauses so far
    pub fn pauses(&self) -> u32 {
        self.pauses
    }
}
