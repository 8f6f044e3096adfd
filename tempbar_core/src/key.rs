//! Four-character SMC identifiers.

use std::{fmt, str::FromStr};

/// A fixed-width, four byte identifier such as `TC0P` or `sp78`.
///
/// SMC keys and SMC data type tags share this shape. On the wire both are sent as the four ASCII
/// bytes packed into a big-endian `u32`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorKey([u8; 4]);

/// The type tags share the key representation.
pub type DataType = SensorKey;

impl SensorKey {
    /// Builds a key from a four byte literal. Used for the static tables.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Parses a key, returning `None` unless the input is exactly four ASCII bytes.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
        bytes.iter().all(u8::is_ascii).then_some(Self(bytes))
    }

    #[inline]
    pub const fn from_u32(code: u32) -> Self {
        Self(code.to_be_bytes())
    }

    #[inline]
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// Builds a [`SensorKey`] from a four character literal at compile time.
#[macro_export]
macro_rules! key {
    ($s:literal) => {{
        const BYTES: &[u8] = $s.as_bytes();
        $crate::SensorKey::from_bytes([BYTES[0], BYTES[1], BYTES[2], BYTES[3]])
    }};
}

impl FromStr for SensorKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_four_ascii_bytes() {
        assert_eq!(SensorKey::parse("TC0P"), Some(key!("TC0P")));
        assert_eq!(SensorKey::parse("flt "), Some(key!("flt ")));
        assert!(SensorKey::parse("TC0").is_none());
        assert!(SensorKey::parse("TC0PX").is_none());
        assert!(SensorKey::parse("TCé").is_none());
    }

    #[test]
    fn test_wire_form_is_big_endian() {
        let key = key!("TC0P");
        assert_eq!(key.to_u32(), 0x5443_3050);
        assert_eq!(SensorKey::from_u32(0x5443_3050), key);
    }

    #[test]
    fn test_display_keeps_trailing_space() {
        assert_eq!(key!("flt ").to_string(), "flt ");
        assert_eq!(format!("{:?}", key!("sp78")), "\"sp78\"");
    }
}
