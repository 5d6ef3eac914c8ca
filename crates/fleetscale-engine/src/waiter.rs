//! Reachability polling with exponential backoff

use std::time::Duration;

/// Backoff between reachability checks
#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2000,
            max_delay_ms: 10000,
            multiplier: 1.5,
        }
    }
}

impl WaitConfig {
    /// Delay before the check that follows attempt `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}
