use std::time::Duration;

/// Backoff schedule for document status polling.
///
/// The wait after attempt `n` (0-based) is `base * min(growth^n, cap)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub base: Duration,
    pub growth: f64,
    pub cap: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            base: Duration::from_secs(2),
            growth: 1.5,
            cap: 8.0,
        }
    }
}

impl PollConfig {
    pub fn interval(&self, attempt: u32) -> Duration {
        let factor = self
            .growth
            .powi(attempt.min(i32::MAX as u32) as i32)
            .min(self.cap);
        self.base.mul_f64(factor)
    }

    /// Worst-case time spent sleeping before the budget runs out.
    pub fn total_wait(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.interval(attempt))
            .sum()
    }
}
