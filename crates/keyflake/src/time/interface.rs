use std::sync::Arc;

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the system clock, a monotonic
/// ticker, or a mocked time source in tests.
///
/// The unit is **milliseconds since the Unix epoch**. The allocator rebases
/// readings onto [`EPOCH`] itself.
///
/// # Example
///
/// ```
/// use keyflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_704_067_201_234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1_704_067_201_234);
/// ```
///
/// [`EPOCH`]: crate::EPOCH
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
