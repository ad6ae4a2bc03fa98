use std::{sync::Arc, thread};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    EPOCH, Error, IdGenerator, Identity, MAX_SEQUENCE, MAX_TIMESTAMP, Result, RollbackPolicy,
    SnowflakeId, TimeSource,
    generator::Mutex,
};

/// Mutable generation state, only ever touched under the allocator lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct State {
    /// Last issued sequence value within `last_timestamp`.
    sequence: u64,
    /// Last observed clock reading in Unix milliseconds, `None` until the
    /// first ID is issued.
    last_timestamp: Option<u64>,
}

/// A lock-based Snowflake ID allocator suitable for multi-threaded
/// environments.
///
/// Every call to [`IdAllocator::try_next_id`] runs entirely inside one
/// critical section: reading the clock, choosing between the rollback,
/// same-millisecond and new-millisecond branches, updating the counters and
/// packing the ID. Two callers can therefore never observe the same state.
///
/// Cloning an allocator clones the *handle*: all clones share one state and
/// one identity, which is how a single per-process allocator is passed
/// around. Build one at startup and inject it where IDs are needed.
///
/// ## Blocking
///
/// Two paths can delay a caller while the lock is held:
/// - a tolerated clock rollback sleeps for at most
///   [`RollbackPolicy::max_wait`] (10 ms by default);
/// - exhausting the 4096 sequence values of a millisecond spins until the
///   clock advances, normally under 1 ms.
///
/// Async callers should go through a blocking-capable context (e.g.
/// `spawn_blocking`) if those bounds matter to their scheduler.
///
/// ## See Also
/// - [`IdGenerator`]
/// - [`RollbackPolicy`]
pub struct IdAllocator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<State>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<State>>,
    identity: Identity,
    policy: RollbackPolicy,
    time: T,
}

impl<T> IdAllocator<T>
where
    T: TimeSource,
{
    /// Creates a new allocator for `identity` with the default
    /// [`RollbackPolicy`].
    ///
    /// # Example
    /// ```
    /// use keyflake::{IdAllocator, Identity, SystemClock, datacenter_of, worker_of};
    ///
    /// let allocator = IdAllocator::new(Identity::new(3, 7)?, SystemClock);
    /// let id = allocator.next_id()?;
    /// assert_eq!(datacenter_of(id), 3);
    /// assert_eq!(worker_of(id), 7);
    /// # Ok::<(), keyflake::Error>(())
    /// ```
    pub fn new(identity: Identity, time: T) -> Self {
        Self::with_policy(identity, time, RollbackPolicy::default())
    }

    /// Creates a new allocator with an explicit rollback policy.
    pub fn with_policy(identity: Identity, time: T, policy: RollbackPolicy) -> Self {
        #[cfg(feature = "tracing")]
        tracing::info!(
            datacenter_id = identity.datacenter_id(),
            worker_id = identity.worker_id(),
            max_backward_ms = policy.max_backward_ms,
            "id allocator initialized"
        );

        let state = Mutex::new(State::default());
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(state),
            identity,
            policy,
            time,
        }
    }

    /// Validates raw identity parameters and creates an allocator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either id is outside `0..=31`.
    pub fn try_new(datacenter_id: i64, worker_id: i64, time: T) -> Result<Self> {
        Ok(Self::new(Identity::new(datacenter_id, worker_id)?, time))
    }

    /// The identity stamped into every ID.
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// The datacenter id, `0..=31`.
    pub const fn datacenter_id(&self) -> u64 {
        self.identity.datacenter_id()
    }

    /// The worker id, `0..=31`.
    pub const fn worker_id(&self) -> u64 {
        self.identity.worker_id()
    }

    /// The clock rollback policy in effect.
    pub const fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    /// Generates the next ID.
    ///
    /// IDs from one allocator are unique and non-decreasing in call order as
    /// long as the clock does not move backward.
    ///
    /// # Errors
    /// - [`Error::ClockMovedBack`] if the clock is behind the last issued
    ///   timestamp by more than the policy tolerates, or still behind after
    ///   waiting.
    /// - [`Error::TimestampOutOfRange`] if the clock reads before [`EPOCH`]
    ///   or past the 41-bit range.
    /// - [`Error::LockPoisoned`] if another thread panicked while holding
    ///   the lock (never with `parking-lot`).
    ///
    /// No state is committed when an error is returned.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<SnowflakeId> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let mut now = self.time.current_millis();
        let (now, sequence) = match state.last_timestamp {
            None => (now, 0),
            Some(last) => {
                if now < last {
                    now = self.cold_clock_behind(now, last)?;
                }
                if now == last {
                    let sequence = (state.sequence + 1) & MAX_SEQUENCE;
                    if sequence == 0 {
                        (self.cold_wait_next_millis(last), 0)
                    } else {
                        (now, sequence)
                    }
                } else {
                    (now, 0)
                }
            }
        };

        let timestamp = Self::timestamp_offset(now)?;
        state.sequence = sequence;
        state.last_timestamp = Some(now);

        Ok(SnowflakeId::from_components(
            timestamp,
            self.identity.datacenter_id(),
            self.identity.worker_id(),
            sequence,
        ))
    }

    /// Generates the next ID as a raw `u64`.
    ///
    /// # Errors
    ///
    /// See [`IdAllocator::try_next_id`].
    pub fn next_id(&self) -> Result<u64> {
        self.try_next_id().map(|id| id.to_raw())
    }

    /// Generates the next ID as a decimal string.
    ///
    /// # Errors
    ///
    /// See [`IdAllocator::try_next_id`].
    pub fn next_id_string(&self) -> Result<String> {
        self.try_next_id().map(|id| id.to_string())
    }

    fn timestamp_offset(now: u64) -> Result<u64> {
        match now.checked_sub(EPOCH) {
            Some(offset) if offset <= MAX_TIMESTAMP => Ok(offset),
            _ => Err(Error::TimestampOutOfRange { millis: now }),
        }
    }

    /// Waits out a small backward jump, returning a clock reading that is
    /// no longer behind `last`.
    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64, last: u64) -> Result<u64> {
        let mut drift_ms = last - now;
        if !self.policy.tolerates(drift_ms) {
            #[cfg(feature = "tracing")]
            tracing::error!(drift_ms, "clock moved backwards beyond tolerance");
            return Err(Error::ClockMovedBack { drift_ms });
        }

        for _ in 0..self.policy.max_retries {
            #[cfg(feature = "tracing")]
            tracing::warn!(drift_ms, "clock moved backwards, waiting for it to catch up");
            thread::sleep(self.policy.wait_for(drift_ms));

            let now = self.time.current_millis();
            if now >= last {
                return Ok(now);
            }
            drift_ms = last - now;
            if drift_ms > self.policy.max_backward_ms {
                break;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::error!(drift_ms, "clock still behind after waiting");
        Err(Error::ClockMovedBack { drift_ms })
    }

    /// Spins until the clock moves past `last`.
    #[cold]
    #[inline(never)]
    fn cold_wait_next_millis(&self, last: u64) -> u64 {
        #[cfg(feature = "tracing")]
        tracing::debug!(last, "sequence exhausted, spinning to next millisecond");
        loop {
            let now = self.time.current_millis();
            if now > last {
                return now;
            }
            core::hint::spin_loop();
        }
    }
}

impl<T> Clone for IdAllocator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            identity: self.identity,
            policy: self.policy,
            time: self.time.clone(),
        }
    }
}

impl<T> core::fmt::Debug for IdAllocator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdAllocator")
            .field("identity", &self.identity)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<T> IdGenerator for IdAllocator<T>
where
    T: TimeSource,
{
    fn try_next_id(&self) -> Result<SnowflakeId> {
        self.try_next_id()
    }
}
