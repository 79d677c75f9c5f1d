//! Randomized pacing between page fetches
//!
//! The crawl is sequential; the pacer only spaces fetches out so the crawl
//! looks less like a bot. It keeps no state between calls.

use crate::config::PacingConfig;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Picks and sleeps randomized delays
#[derive(Debug, Clone)]
pub struct Pacer {
    normal: RangeInclusive<u64>,
    slow: RangeInclusive<u64>,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(&PacingConfig::default())
    }
}

impl Pacer {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            normal: config.min_delay_secs..=config.max_delay_secs,
            slow: config.slow_min_delay_secs..=config.slow_max_delay_secs,
        }
    }

    /// A pacer that never sleeps
    pub fn disabled() -> Self {
        Self {
            normal: 0..=0,
            slow: 0..=0,
        }
    }

    /// The range (in seconds) used for the given mode
    pub fn range(&self, slow: bool) -> &RangeInclusive<u64> {
        if slow {
            &self.slow
        } else {
            &self.normal
        }
    }

    /// Draws a delay uniformly from the mode's range
    pub fn pick_delay(&self, slow: bool) -> Duration {
        let range = self.range(slow);
        let secs = if range.is_empty() {
            *range.start()
        } else {
            rand::thread_rng().gen_range(range.clone())
        };
        Duration::from_secs(secs)
    }

    /// Sleeps for a freshly drawn delay
    pub async fn delay(&self, slow: bool) {
        let wait = self.pick_delay(slow);
        if wait.is_zero() {
            return;
        }

        tracing::info!("Waiting for {} seconds...", wait.as_secs());
        tokio::time::sleep(wait).await;
    }
}
