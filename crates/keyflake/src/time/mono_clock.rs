use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use crate::{SystemClock, TimeSource};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    elapsed: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A time source anchored to the wall clock once, then advanced by a
/// monotonic timer.
///
/// Readings never go backward, even if the system clock is stepped by NTP,
/// so an allocator driven by this clock never takes the rollback path. The
/// trade-off is drift: after a long uptime the reported time can diverge
/// from the wall clock by whatever correction NTP would have applied.
///
/// A background thread stores the elapsed milliseconds into a shared atomic
/// once per millisecond, keeping syscalls off the hot path. The thread exits
/// once every clone of the clock has been dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    anchor_millis: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Starts a new ticker anchored at the current wall-clock time.
    ///
    /// # Example
    ///
    /// ```
    /// use keyflake::{MonotonicClock, SystemClock, TimeSource};
    ///
    /// let clock = MonotonicClock::new();
    /// let first = clock.current_millis();
    /// std::thread::sleep(std::time::Duration::from_millis(5));
    /// assert!(clock.current_millis() >= first);
    /// // Anchored to the wall clock, so both agree closely.
    /// assert!(SystemClock.current_millis().abs_diff(first) < 1_000);
    /// ```
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor_millis = SystemClock.current_millis();

        let inner = Arc::new(SharedTickerInner {
            elapsed: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                let target = start + Duration::from_millis(tick);
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.elapsed.store(now_ms, Ordering::Relaxed);

                // Align to the next tick after the actual time
                tick = now_ms + 1;
            }
        });

        // Freshly created, nothing else can have set it.
        let _ = inner._handle.set(handle);

        Self {
            inner,
            anchor_millis,
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.anchor_millis + self.inner.elapsed.load(Ordering::Relaxed)
    }
}
