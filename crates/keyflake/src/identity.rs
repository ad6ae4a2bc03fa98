//! Static datacenter/worker identity of an allocator.
//!
//! Uniqueness across instances rests entirely on no two live allocators
//! sharing the same `(datacenter_id, worker_id)` pair. Assigning those pairs
//! is a deployment concern; this module only validates them and offers a
//! best-effort fallback when the worker id was not configured.

#[cfg(feature = "tracing")]
use tracing::warn;

use crate::{Error, MAX_DATACENTER_ID, MAX_WORKER_ID, Result};

/// Environment variables consulted, in order, for a stable node identifier.
pub const NODE_NAME_VARS: [&str; 2] = ["HOSTNAME", "COMPUTERNAME"];

/// A validated `(datacenter_id, worker_id)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    datacenter_id: u64,
    worker_id: u64,
}

impl Identity {
    /// Validates both parameters against their 5-bit range.
    ///
    /// Signed inputs let out-of-range configuration such as `-1` reach this
    /// check instead of wrapping silently at a conversion site.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either value is outside `0..=31`.
    ///
    /// # Example
    ///
    /// ```
    /// use keyflake::Identity;
    ///
    /// assert!(Identity::new(31, 31).is_ok());
    /// assert!(Identity::new(32, 0).is_err());
    /// assert!(Identity::new(0, -1).is_err());
    /// ```
    pub fn new(datacenter_id: i64, worker_id: i64) -> Result<Self> {
        Ok(Self {
            datacenter_id: check_range("datacenter_id", datacenter_id, MAX_DATACENTER_ID)?,
            worker_id: check_range("worker_id", worker_id, MAX_WORKER_ID)?,
        })
    }

    /// Builds an identity, deriving the worker id when it is unset.
    ///
    /// The node identifier is read from [`NODE_NAME_VARS`]. See
    /// [`Identity::resolve_with_node`] for the derivation rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a supplied value is out of range.
    pub fn resolve(datacenter_id: i64, worker_id: Option<i64>) -> Result<Self> {
        let node = node_name(|var| std::env::var(var).ok());
        Self::resolve_with_node(datacenter_id, worker_id, node.as_deref())
    }

    /// Builds an identity from an explicit node identifier.
    ///
    /// - A configured `worker_id` always wins and is validated.
    /// - Otherwise the worker id is the FNV-1a hash of `node` modulo 32, so
    ///   the same node always lands on the same worker id.
    /// - With no usable node identifier a random worker id is drawn. Two
    ///   co-located instances can collide in that case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a supplied value is out of range.
    pub fn resolve_with_node(
        datacenter_id: i64,
        worker_id: Option<i64>,
        node: Option<&str>,
    ) -> Result<Self> {
        let worker_id = match (worker_id, node.map(str::trim).filter(|n| !n.is_empty())) {
            (Some(worker_id), _) => worker_id,
            (None, Some(node)) => (fnv1a(node.as_bytes()) % (MAX_WORKER_ID + 1)) as i64,
            (None, None) => {
                let worker_id = rand::random_range(0..=MAX_WORKER_ID) as i64;
                #[cfg(feature = "tracing")]
                warn!(worker_id, "no node identifier available, using a random worker id");
                worker_id
            }
        };
        Self::new(datacenter_id, worker_id)
    }

    /// The datacenter id, `0..=31`.
    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    /// The worker id, `0..=31`.
    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }
}

/// First non-blank value among [`NODE_NAME_VARS`].
fn node_name(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    NODE_NAME_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|name| !name.trim().is_empty()))
}

fn check_range(field: &'static str, value: i64, max: u64) -> Result<u64> {
    match u64::try_from(value) {
        Ok(v) if v <= max => Ok(v),
        _ => Err(Error::Configuration { field, value, max }),
    }
}

/// 64-bit FNV-1a. Stable across builds and platforms, unlike `std`'s hasher.
const fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}
