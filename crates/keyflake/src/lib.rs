//! Process-local Snowflake-style ID allocation.
//!
//! Every service instance embeds one [`IdAllocator`] configured with a
//! static [`Identity`] (datacenter id + worker id) and hands out 64-bit IDs
//! without talking to a central sequencer:
//!
//! ```text
//!  | 0 | timestamp (41) | datacenter (5) | worker (5) | sequence (12) |
//! ```
//!
//! IDs from one allocator are unique and ordered; IDs across instances are
//! unique as long as identities are distinct, and roughly ordered by wall
//! clock.
//!
//! ```
//! use keyflake::{IdAllocator, Identity, SystemClock, sequence_of};
//!
//! let allocator = IdAllocator::new(Identity::new(1, 2)?, SystemClock);
//! let a = allocator.next_id()?;
//! let b = allocator.next_id()?;
//! assert!(b > a);
//! # Ok::<(), keyflake::Error>(())
//! ```

mod error;
mod generator;
mod id;
mod identity;
#[cfg(feature = "serde")]
pub mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::identity::*;
pub use crate::time::*;
