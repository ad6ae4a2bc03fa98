//! Serde adapters for [`SnowflakeId`].
//!
//! `SnowflakeId` itself serializes transparently as its `u64`. Use
//! [`as_string`] on fields that cross into consumers which read numbers as
//! `f64` (JavaScript, many JSON toolchains) and would otherwise lose
//! precision above 2^53.
//!
//! [`SnowflakeId`]: crate::SnowflakeId

pub mod as_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use crate::SnowflakeId;

    /// Serialize an ID as its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize an ID from its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a string, is not a decimal
    /// integer, or has the reserved sign bit set.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = <std::borrow::Cow<'de, str>>::deserialize(d)?;
        let id: SnowflakeId = text.parse().map_err(de::Error::custom)?;
        if !id.is_valid() {
            return Err(de::Error::custom(format!(
                "id {id} has the reserved sign bit set"
            )));
        }
        Ok(id)
    }
}
