use core::time::Duration;

/// How the allocator reacts when the clock reads earlier than the last
/// issued timestamp.
///
/// A backward jump of at most `max_backward_ms` blocks the caller for
/// `drift * wait_factor` milliseconds and re-reads the clock, up to
/// `max_retries` times. Anything larger, or a clock that is still behind
/// after the last retry, fails with [`Error::ClockMovedBack`].
///
/// The defaults (5 ms, x2, one retry) bound the worst-case block to 10 ms.
///
/// # Example
///
/// ```
/// use keyflake::RollbackPolicy;
///
/// let strict = RollbackPolicy::default().with_max_backward_ms(0);
/// assert_eq!(strict.max_wait().as_millis(), 0);
/// assert_eq!(RollbackPolicy::default().max_wait().as_millis(), 10);
/// ```
///
/// [`Error::ClockMovedBack`]: crate::Error::ClockMovedBack
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RollbackPolicy {
    /// Largest backward drift, in milliseconds, that is waited out.
    pub max_backward_ms: u64,
    /// Multiplier applied to the drift to get the wait duration.
    pub wait_factor: u64,
    /// Number of clock re-reads after waiting before giving up.
    pub max_retries: u32,
}

impl RollbackPolicy {
    /// Default tolerated drift.
    pub const DEFAULT_MAX_BACKWARD_MS: u64 = 5;
    /// Default wait multiplier.
    pub const DEFAULT_WAIT_FACTOR: u64 = 2;
    /// Default retry count.
    pub const DEFAULT_MAX_RETRIES: u32 = 1;

    /// A policy with the default tolerance, wait factor and retry count.
    pub const fn new() -> Self {
        Self {
            max_backward_ms: Self::DEFAULT_MAX_BACKWARD_MS,
            wait_factor: Self::DEFAULT_WAIT_FACTOR,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the largest backward drift, in milliseconds, that is waited out.
    #[must_use]
    pub const fn with_max_backward_ms(mut self, max_backward_ms: u64) -> Self {
        self.max_backward_ms = max_backward_ms;
        self
    }

    /// Sets the multiplier applied to the drift to get the wait duration.
    #[must_use]
    pub const fn with_wait_factor(mut self, wait_factor: u64) -> Self {
        self.wait_factor = wait_factor;
        self
    }

    /// Sets how many times the clock is re-read after waiting.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns `true` if a drift of `drift_ms` should be waited out.
    pub const fn tolerates(&self, drift_ms: u64) -> bool {
        drift_ms <= self.max_backward_ms && self.max_retries > 0
    }

    /// How long to block for a given drift.
    pub const fn wait_for(&self, drift_ms: u64) -> Duration {
        Duration::from_millis(drift_ms.saturating_mul(self.wait_factor))
    }

    /// Upper bound on the time a single wait can block a caller.
    pub const fn max_wait(&self) -> Duration {
        self.wait_for(self.max_backward_ms)
    }
}

impl Default for RollbackPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_preserved() {
        let policy = RollbackPolicy::default();
        assert_eq!(policy.max_backward_ms, 5);
        assert_eq!(policy.wait_factor, 2);
        assert_eq!(policy.max_retries, 1);
    }

    #[test]
    fn tolerance_boundary() {
        let policy = RollbackPolicy::default();
        assert!(policy.tolerates(0));
        assert!(policy.tolerates(5));
        assert!(!policy.tolerates(6));
        assert_eq!(policy.wait_for(3), Duration::from_millis(6));
    }

    #[test]
    fn zero_retries_disables_waiting() {
        let policy = RollbackPolicy::default().with_max_retries(0);
        assert!(!policy.tolerates(1));
    }

    #[test]
    fn wait_saturates() {
        let policy = RollbackPolicy::default()
            .with_max_backward_ms(u64::MAX)
            .with_wait_factor(4);
        assert_eq!(policy.max_wait(), Duration::from_millis(u64::MAX));
    }
}
