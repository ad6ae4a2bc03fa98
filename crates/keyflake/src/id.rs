use core::{fmt, str::FromStr};

use crate::Error;

/// Custom epoch: Monday, January 1, 2024 00:00:00 UTC, in Unix milliseconds.
///
/// The 41-bit timestamp field counts from here and runs out roughly 69 years
/// later (mid-2093).
pub const EPOCH: u64 = 1_704_067_200_000;

/// Width of the timestamp offset field.
pub const TIMESTAMP_BITS: u32 = 41;

/// Width of the datacenter id field.
pub const DATACENTER_ID_BITS: u32 = 5;

/// Width of the worker id field.
pub const WORKER_ID_BITS: u32 = 5;

/// Width of the per-millisecond sequence field.
pub const SEQUENCE_BITS: u32 = 12;

/// Largest datacenter id (31).
pub const MAX_DATACENTER_ID: u64 = (1 << DATACENTER_ID_BITS) - 1;

/// Largest worker id (31).
pub const MAX_WORKER_ID: u64 = (1 << WORKER_ID_BITS) - 1;

/// Largest sequence value within one millisecond (4095).
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest timestamp offset (milliseconds past [`EPOCH`]).
pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// A 64-bit Snowflake ID
///
/// - 1 bit reserved (always 0, keeps the value positive as an `i64`)
/// - 41 bits timestamp (ms since [`EPOCH`])
/// - 5 bits datacenter ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63     62           22 21       17 16       12 11          0
///              +-----+----------------+-----------+-----------+-------------+
///  Field:      | (1) | timestamp (41) |  dc (5)   | worker (5)| sequence(12)|
///              +-----+----------------+-----------+-----------+-------------+
///              |<------------ MSB -------- 64 bits -------- LSB ----------->|
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for the 41-bit timestamp field once shifted down.
    pub const TIMESTAMP_MASK: u64 = MAX_TIMESTAMP;

    /// Bitmask for the 5-bit datacenter ID field once shifted down.
    pub const DATACENTER_ID_MASK: u64 = MAX_DATACENTER_ID;

    /// Bitmask for the 5-bit worker ID field once shifted down.
    pub const WORKER_ID_MASK: u64 = MAX_WORKER_ID;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = MAX_SEQUENCE;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = DATACENTER_ID_BITS + WORKER_ID_BITS + SEQUENCE_BITS;

    /// Number of bits to shift the datacenter ID to its position (bit 17).
    pub const DATACENTER_ID_SHIFT: u32 = WORKER_ID_BITS + SEQUENCE_BITS;

    /// Number of bits to shift the worker ID to its position (bit 12).
    pub const WORKER_ID_SHIFT: u32 = SEQUENCE_BITS;

    /// Packs the four fields into an ID. Out-of-range inputs are truncated to
    /// their field width.
    pub const fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = sequence & Self::SEQUENCE_MASK;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Wraps a raw integer without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the packed integer.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Extracts the timestamp offset (ms since [`EPOCH`]).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the timestamp as Unix milliseconds.
    pub const fn unix_millis(&self) -> u64 {
        self.timestamp() + EPOCH
    }

    /// Extracts the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Returns `true` if the reserved sign bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id >> 63 == 0
    }

    /// Returns the ID as a zero-padded 19-digit string, which sorts
    /// lexicographically in the same order as the integers.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

/// Returns the Unix-millisecond timestamp encoded in `id`.
pub const fn timestamp_of(id: u64) -> u64 {
    (id >> SnowflakeId::TIMESTAMP_SHIFT) + EPOCH
}

/// Returns the datacenter ID encoded in `id`.
pub const fn datacenter_of(id: u64) -> u64 {
    (id >> SnowflakeId::DATACENTER_ID_SHIFT) & SnowflakeId::DATACENTER_ID_MASK
}

/// Returns the worker ID encoded in `id`.
pub const fn worker_of(id: u64) -> u64 {
    (id >> SnowflakeId::WORKER_ID_SHIFT) & SnowflakeId::WORKER_ID_MASK
}

/// Returns the sequence number encoded in `id`.
pub const fn sequence_of(id: u64) -> u64 {
    id & SnowflakeId::SEQUENCE_MASK
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.id
    }
}

impl From<SnowflakeId> for i64 {
    /// Lossless for every ID the allocator produces since the sign bit is
    /// reserved.
    fn from(id: SnowflakeId) -> Self {
        id.id as i64
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_raw(s.trim().parse::<u64>()?))
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_match_layout() {
        assert_eq!(SnowflakeId::TIMESTAMP_SHIFT, 22);
        assert_eq!(SnowflakeId::DATACENTER_ID_SHIFT, 17);
        assert_eq!(SnowflakeId::WORKER_ID_SHIFT, 12);
        assert_eq!(
            1 + TIMESTAMP_BITS + DATACENTER_ID_BITS + WORKER_ID_BITS + SEQUENCE_BITS,
            64
        );
    }

    #[test]
    fn components_pack_and_unpack() {
        let id = SnowflakeId::from_components(123_456, 7, 19, 4000);
        assert_eq!(id.timestamp(), 123_456);
        assert_eq!(id.datacenter_id(), 7);
        assert_eq!(id.worker_id(), 19);
        assert_eq!(id.sequence(), 4000);
        assert_eq!(
            id.to_raw(),
            (123_456 << 22) | (7 << 17) | (19 << 12) | 4000
        );
    }

    #[test]
    fn free_functions_agree_with_accessors() {
        let id = SnowflakeId::from_components(98_765_432, 31, 0, 17);
        let raw = id.to_raw();
        assert_eq!(timestamp_of(raw), id.unix_millis());
        assert_eq!(timestamp_of(raw), 98_765_432 + EPOCH);
        assert_eq!(datacenter_of(raw), 31);
        assert_eq!(worker_of(raw), 0);
        assert_eq!(sequence_of(raw), 17);
    }

    #[test]
    fn max_values_never_touch_sign_bit() {
        let id =
            SnowflakeId::from_components(MAX_TIMESTAMP, MAX_DATACENTER_ID, MAX_WORKER_ID, MAX_SEQUENCE);
        assert!(id.is_valid());
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert_eq!(i64::from(id), i64::MAX);
        assert!(!SnowflakeId::from_raw(u64::MAX).is_valid());
    }

    #[test]
    fn fields_are_truncated_to_width() {
        let id = SnowflakeId::from_components(0, 32, 33, 4096);
        assert_eq!(id.datacenter_id(), 0);
        assert_eq!(id.worker_id(), 1);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn display_and_parse() {
        let id = SnowflakeId::from_components(1, 2, 3, 4);
        let text = id.to_string();
        assert_eq!(text, id.to_raw().to_string());
        assert_eq!(text.parse::<SnowflakeId>().unwrap(), id);
        assert_eq!(id.to_padded_string().len(), 19);
        assert!("not-a-number".parse::<SnowflakeId>().is_err());
    }

    #[test]
    fn padded_strings_sort_like_integers() {
        let a = SnowflakeId::from_components(1, 0, 0, 0);
        let b = SnowflakeId::from_components(1_000_000, 0, 0, 0);
        assert!(a < b);
        assert!(a.to_padded_string() < b.to_padded_string());
    }
}
