//! Opaque RDATA for record types the codec does not model.

use bytes::BytesMut;
use std::fmt;

/// An unknown record type, preserved as raw RDATA bytes.
///
/// Unknown records round-trip losslessly but are never cached
/// (RFC 3597 treatment minus the presentation format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unknown {
    /// The numeric record type.
    type_code: u16,
    /// The raw RDATA.
    data: Vec<u8>,
}

impl Unknown {
    /// Creates an opaque record from its type code and raw RDATA.
    pub fn new(type_code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            type_code,
            data: data.into(),
        }
    }

    /// Returns the numeric record type.
    #[inline]
    pub const fn type_code(&self) -> u16 {
        self.type_code
    }

    /// Returns the raw RDATA bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the wire format length.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.data.len()
    }

    /// Writes the RDATA to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.data);
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // RFC 3597 generic encoding
        write!(f, "\\# {}", self.data.len())?;
        for byte in &self.data {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}
