//! Address record types (A, AAAA).

use crate::error::{Error, Result};
use bytes::BytesMut;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A record - IPv4 address (RFC 1035).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A {
    /// The IPv4 address.
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    #[inline]
    pub const fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the address.
    #[inline]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Parses an A record from its RDATA slice.
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        let octets: [u8; 4] = rdata.try_into().map_err(|_| Error::RDataLengthMismatch {
            rtype: "A".into(),
            declared: rdata.len(),
            consumed: 4,
        })?;
        Ok(Self {
            address: Ipv4Addr::from(octets),
        })
    }

    /// Returns the wire format length.
    #[inline]
    pub const fn wire_len(&self) -> usize {
        4
    }

    /// Writes the RDATA to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.address.octets());
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl From<Ipv4Addr> for A {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

/// AAAA record - IPv6 address (RFC 3596).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AAAA {
    /// The IPv6 address.
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    #[inline]
    pub const fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the address.
    #[inline]
    pub const fn address(&self) -> Ipv6Addr {
        self.address
    }

    /// Parses an AAAA record from its RDATA slice.
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        let octets: [u8; 16] = rdata.try_into().map_err(|_| Error::RDataLengthMismatch {
            rtype: "AAAA".into(),
            declared: rdata.len(),
            consumed: 16,
        })?;
        Ok(Self {
            address: Ipv6Addr::from(octets),
        })
    }

    /// Returns the wire format length.
    #[inline]
    pub const fn wire_len(&self) -> usize {
        16
    }

    /// Writes the RDATA to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.address.octets());
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl From<Ipv6Addr> for AAAA {
    fn from(address: Ipv6Addr) -> Self {
        Self::new(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a_roundtrip() {
        let a = A::new(Ipv4Addr::new(93, 184, 216, 34));
        let mut buf = BytesMut::new();
        a.write_to(&mut buf);

        assert_eq!(buf.len(), a.wire_len());
        let parsed = A::parse(&buf).unwrap();
        assert_eq!(parsed, a);
        assert_eq!(parsed.address(), Ipv4Addr::new(93, 184, 216, 34));
    }

    #[test]
    fn test_aaaa_roundtrip() {
        let aaaa = AAAA::new("2001:db8::1".parse().unwrap());
        let mut buf = BytesMut::new();
        aaaa.write_to(&mut buf);

        assert_eq!(buf.len(), 16);
        assert_eq!(AAAA::parse(&buf).unwrap(), aaaa);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(A::parse(&[1, 2, 3]).is_err());
        assert!(A::parse(&[1, 2, 3, 4, 5]).is_err());
        assert!(AAAA::parse(&[0; 4]).is_err());
    }
}
