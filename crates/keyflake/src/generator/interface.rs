use crate::{Result, SnowflakeId};

/// A minimal interface for handing out Snowflake IDs.
///
/// Implemented by [`IdAllocator`] so callers can accept any allocator handle
/// (or a test double) without naming the clock type.
///
/// [`IdAllocator`]: crate::IdAllocator
pub trait IdGenerator {
    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the clock moved backward beyond the tolerated
    /// window, if the clock is outside the representable range, or if the
    /// underlying lock is poisoned.
    fn try_next_id(&self) -> Result<SnowflakeId>;

    /// Generates the next ID as a raw `u64`.
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_next_id`].
    fn next_id(&self) -> Result<u64> {
        self.try_next_id().map(|id| id.to_raw())
    }

    /// Generates the next ID as a decimal string, for consumers that cannot
    /// hold a full 64-bit integer (e.g. JSON numbers read as `f64`).
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_next_id`].
    fn next_id_string(&self) -> Result<String> {
        self.try_next_id().map(|id| id.to_string())
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &G {
    fn try_next_id(&self) -> Result<SnowflakeId> {
        (**self).try_next_id()
    }
}
