use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The operating system wall clock.
///
/// Readings follow NTP slews and steps, so this clock can move backward. The
/// allocator's [`RollbackPolicy`] decides how much of that is tolerated.
///
/// A clock set before 1970 reads as `0`, which the allocator rejects as out
/// of range rather than producing a corrupt ID.
///
/// [`RollbackPolicy`]: crate::RollbackPolicy
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPOCH;

    #[test]
    fn reads_after_epoch() {
        assert!(SystemClock.current_millis() > EPOCH);
    }
}
