//! DNS record classes.
//!
//! The class field is 15 bits on the wire for multicast DNS: the top bit
//! is repurposed as the cache-flush bit on records (RFC 6762 Section
//! 10.2) and as the unicast-response bit on questions (Section 5.4).

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mask for the mDNS cache-flush / unicast-response bit.
pub const CLASS_TOP_BIT: u16 = 0x8000;

/// Mask for the 15-bit class value itself.
pub const CLASS_MASK: u16 = 0x7FFF;

/// DNS record class.
///
/// See RFC 1035 Section 3.2.4 and RFC 6895. IN is used almost
/// exclusively; the rest exist so parsed values stay meaningful.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum RecordClass {
    /// Internet - RFC 1035
    IN = 1,

    /// CHAOS - RFC 1035
    CH = 3,

    /// Hesiod - RFC 1035
    HS = 4,

    /// Query class NONE - RFC 2136
    NONE = 254,

    /// Query class ANY - RFC 1035
    ANY = 255,
}

impl RecordClass {
    /// Returns the numeric value of the class.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Creates a class from its numeric value.
    #[inline]
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Returns the human-readable name of the class.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IN => "IN",
            Self::CH => "CH",
            Self::HS => "HS",
            Self::NONE => "NONE",
            Self::ANY => "ANY",
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Default for RecordClass {
    fn default() -> Self {
        Self::IN
    }
}

/// A class value that can represent both known and unknown values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
    /// A known, standard class.
    Known(RecordClass),
    /// An unknown class value.
    Unknown(u16),
}

impl Class {
    /// Creates a class from a u16 value.
    ///
    /// The value must already have the mDNS top bit stripped.
    #[inline]
    pub fn from_u16(value: u16) -> Self {
        RecordClass::from_u16(value)
            .map(Self::Known)
            .unwrap_or(Self::Unknown(value))
    }

    /// Splits a raw 16-bit wire class into (class, top bit).
    #[inline]
    pub fn from_wire(raw: u16) -> (Self, bool) {
        (Self::from_u16(raw & CLASS_MASK), raw & CLASS_TOP_BIT != 0)
    }

    /// Returns the raw wire value, optionally with the top bit set.
    #[inline]
    pub const fn to_wire(self, top_bit: bool) -> u16 {
        let base = self.to_u16() & CLASS_MASK;
        if top_bit { base | CLASS_TOP_BIT } else { base }
    }

    /// Returns the numeric value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Known(c) => c.to_u16(),
            Self::Unknown(v) => v,
        }
    }

    /// Returns the standard class if known.
    #[inline]
    pub const fn as_known(self) -> Option<RecordClass> {
        match self {
            Self::Known(c) => Some(c),
            Self::Unknown(_) => None,
        }
    }

    /// Returns true if this is the Internet class.
    #[inline]
    pub const fn is_internet(self) -> bool {
        matches!(self, Self::Known(RecordClass::IN))
    }
}

impl From<RecordClass> for Class {
    fn from(c: RecordClass) -> Self {
        Self::Known(c)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(c) => write!(f, "{c}"),
            Self::Unknown(v) => write!(f, "CLASS{v}"),
        }
    }
}

impl Default for Class {
    fn default() -> Self {
        Self::Known(RecordClass::IN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_values() {
        assert_eq!(RecordClass::IN.to_u16(), 1);
        assert_eq!(RecordClass::ANY.to_u16(), 255);
    }

    #[test]
    fn test_wire_split() {
        let (class, flush) = Class::from_wire(0x8001);
        assert_eq!(class, Class::Known(RecordClass::IN));
        assert!(flush);

        let (class, flush) = Class::from_wire(0x0001);
        assert_eq!(class, Class::Known(RecordClass::IN));
        assert!(!flush);
    }

    #[test]
    fn test_wire_rebuild() {
        let class = Class::Known(RecordClass::IN);
        assert_eq!(class.to_wire(true), 0x8001);
        assert_eq!(class.to_wire(false), 0x0001);
    }

    #[test]
    fn test_unknown_class() {
        let c = Class::from_u16(4242);
        assert_eq!(c.as_known(), None);
        assert_eq!(c.to_string(), "CLASS4242");
        assert!(!c.is_internet());
    }
}
