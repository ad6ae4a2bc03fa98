mod interface;
mod lock;
/// Lock backing the allocator state; crate-private.
///
/// ```compile_fail
/// use keyflake::Mutex;
/// ```
mod mutex;
mod policy;

pub use interface::*;
pub use lock::*;
pub(crate) use mutex::*;
pub use policy::*;
