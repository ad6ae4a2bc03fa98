use core::num::ParseIntError;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `keyflake` can emit.
///
/// Sequence exhaustion is deliberately absent: the allocator absorbs it by
/// spinning to the next millisecond, so callers only ever observe latency.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An identity parameter is outside its 5-bit range.
    ///
    /// Raised once, at construction. The allocator (and usually the whole
    /// process) must not start.
    #[error("invalid {field}: {value} (expected 0..={max})")]
    Configuration {
        /// Name of the offending parameter.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Largest accepted value.
        max: u64,
    },

    /// The wall clock moved backward beyond the tolerated window, or was
    /// still behind after the bounded wait.
    ///
    /// This signals environmental clock misbehavior and should be routed to
    /// an operator. Retrying immediately will most likely fail the same way.
    #[error("clock moved backwards by {drift_ms}ms, refusing to generate id")]
    ClockMovedBack {
        /// How far behind the last issued timestamp the clock was observed.
        drift_ms: u64,
    },

    /// The clock reported a time before [`EPOCH`] or past the last
    /// millisecond representable in the 41-bit timestamp field.
    ///
    /// [`EPOCH`]: crate::EPOCH
    #[error("clock reading {millis}ms is outside the representable id range")]
    TimestampOutOfRange {
        /// The raw clock reading in Unix milliseconds.
        millis: u64,
    },

    /// The allocator's lock was poisoned by a panicking thread.
    ///
    /// `parking_lot` mutexes do not poison, so this variant is never produced
    /// with the `parking-lot` feature enabled.
    #[error("allocator lock poisoned")]
    LockPoisoned,

    /// A textual id could not be parsed as a decimal integer.
    #[error("invalid id string: {0}")]
    Parse(#[from] ParseIntError),
}

impl Error {
    /// Returns `true` for errors that mean the allocator must not be used at
    /// all, as opposed to a single failed call.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::LockPoisoned)
    }

    /// Returns `true` when the error was caused by the clock source and
    /// should be surfaced to an alerting path.
    pub const fn is_clock_error(&self) -> bool {
        matches!(
            self,
            Self::ClockMovedBack { .. } | Self::TimestampOutOfRange { .. }
        )
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_is_fatal() {
        let err = Error::Configuration {
            field: "worker_id",
            value: -1,
            max: 31,
        };
        assert!(err.is_fatal());
        assert!(!err.is_clock_error());
        assert_eq!(err.to_string(), "invalid worker_id: -1 (expected 0..=31)");
    }

    #[test]
    fn clock_error_is_not_fatal() {
        let err = Error::ClockMovedBack { drift_ms: 50 };
        assert!(!err.is_fatal());
        assert!(err.is_clock_error());
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn parse_error_converts() {
        let err: Error = "12x".parse::<u64>().unwrap_err().into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
