//! Exponential backoff with jitter for upstream connect attempts.

use std::time::Duration;

use rand::Rng;

use crate::config::UpstreamConfig;

/// Backoff schedule: `base * 2^(attempt-1)`, capped, plus up to 10% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.backoff_base_ms, config.backoff_max_ms)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u64.saturating_pow(attempt - 1);
        let capped = self.base_ms.saturating_mul(factor).min(self.max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}
