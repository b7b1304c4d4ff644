//! DNS record data (RDATA) types.
//!
//! The record family is a closed tagged variant: typed payloads for the
//! client-relevant types, an opaque fallback for everything else.
//! Parsing dispatches on the type tag; every typed parser consumes
//! exactly the declared RDLENGTH or fails.

pub mod address;
pub mod authority;
pub mod name;
pub mod service;
pub mod text;
pub mod unknown;

pub use address::{A, AAAA};
pub use authority::SOA;
pub use name::{CNAME, DNAME, NS, PTR};
pub use service::{HTTPS, SRV, SVCB, SvcParamKey, SvcParamValue};
pub use text::TXT;
pub use unknown::Unknown;

use crate::error::Result;
use crate::name::Name;
use crate::rtype::{RecordType, Type};
use bytes::BytesMut;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// DNS record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RData {
    /// IPv4 address (A record)
    A(A),

    /// IPv6 address (AAAA record)
    AAAA(AAAA),

    /// Name server (NS record)
    NS(NS),

    /// Canonical name (CNAME record)
    CNAME(CNAME),

    /// Delegation name (DNAME record)
    DNAME(DNAME),

    /// Pointer (PTR record)
    PTR(PTR),

    /// Start of authority (SOA record)
    SOA(SOA),

    /// Text (TXT record)
    TXT(TXT),

    /// Service location (SRV record)
    SRV(SRV),

    /// Service binding (SVCB record)
    SVCB(SVCB),

    /// HTTPS service binding (HTTPS record)
    HTTPS(HTTPS),

    /// Any other type, carried as raw RDATA bytes
    Unknown(Unknown),
}

impl RData {
    /// Parses RDATA from wire format.
    ///
    /// # Arguments
    ///
    /// * `rtype` - The record type tag
    /// * `message` - The complete message (names may be compressed)
    /// * `offset` - Offset of the RDATA within the message
    /// * `rdlength` - Declared RDATA length; typed parsers consume
    ///   exactly this many bytes
    pub fn parse(rtype: Type, message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        let rdata_slice = message
            .get(offset..offset + rdlength as usize)
            .ok_or_else(|| {
                crate::error::Error::buffer_too_short(offset + rdlength as usize, message.len())
            })?;

        let known = match rtype.as_known() {
            Some(t) => t,
            None => {
                return Ok(Self::Unknown(Unknown::new(rtype.to_u16(), rdata_slice)));
            }
        };

        match known {
            RecordType::A => Ok(Self::A(A::parse(rdata_slice)?)),
            RecordType::AAAA => Ok(Self::AAAA(AAAA::parse(rdata_slice)?)),
            RecordType::NS => Ok(Self::NS(NS::parse(message, offset)?)),
            RecordType::CNAME => Ok(Self::CNAME(CNAME::parse(message, offset)?)),
            RecordType::DNAME => Ok(Self::DNAME(DNAME::parse(message, offset)?)),
            RecordType::PTR => Ok(Self::PTR(PTR::parse(message, offset)?)),
            RecordType::SOA => Ok(Self::SOA(SOA::parse(message, offset)?)),
            RecordType::TXT => Ok(Self::TXT(TXT::parse(rdata_slice)?)),
            RecordType::SRV => Ok(Self::SRV(SRV::parse(message, offset)?)),
            RecordType::SVCB => Ok(Self::SVCB(SVCB::parse(message, offset, rdlength)?)),
            RecordType::HTTPS => Ok(Self::HTTPS(HTTPS::parse(message, offset, rdlength)?)),
            // OPT, NSEC, and the query-only pseudo-types are not modeled
            _ => Ok(Self::Unknown(Unknown::new(known.to_u16(), rdata_slice))),
        }
    }

    /// Returns the record type tag for this RDATA.
    pub fn record_type(&self) -> Type {
        match self {
            Self::A(_) => Type::Known(RecordType::A),
            Self::AAAA(_) => Type::Known(RecordType::AAAA),
            Self::NS(_) => Type::Known(RecordType::NS),
            Self::CNAME(_) => Type::Known(RecordType::CNAME),
            Self::DNAME(_) => Type::Known(RecordType::DNAME),
            Self::PTR(_) => Type::Known(RecordType::PTR),
            Self::SOA(_) => Type::Known(RecordType::SOA),
            Self::TXT(_) => Type::Known(RecordType::TXT),
            Self::SRV(_) => Type::Known(RecordType::SRV),
            Self::SVCB(_) => Type::Known(RecordType::SVCB),
            Self::HTTPS(_) => Type::Known(RecordType::HTTPS),
            Self::Unknown(u) => Type::from_u16(u.type_code()),
        }
    }

    /// Returns the wire format length of this RDATA.
    pub fn wire_len(&self) -> usize {
        match self {
            Self::A(r) => r.wire_len(),
            Self::AAAA(r) => r.wire_len(),
            Self::NS(r) => r.wire_len(),
            Self::CNAME(r) => r.wire_len(),
            Self::DNAME(r) => r.wire_len(),
            Self::PTR(r) => r.wire_len(),
            Self::SOA(r) => r.wire_len(),
            Self::TXT(r) => r.wire_len(),
            Self::SRV(r) => r.wire_len(),
            Self::SVCB(r) => r.wire_len(),
            Self::HTTPS(r) => r.wire_len(),
            Self::Unknown(r) => r.wire_len(),
        }
    }

    /// Writes this RDATA to wire format. Names inside RDATA are written
    /// uncompressed.
    pub fn write_to(&self, buf: &mut BytesMut) {
        match self {
            Self::A(r) => r.write_to(buf),
            Self::AAAA(r) => r.write_to(buf),
            Self::NS(r) => r.write_to(buf),
            Self::CNAME(r) => r.write_to(buf),
            Self::DNAME(r) => r.write_to(buf),
            Self::PTR(r) => r.write_to(buf),
            Self::SOA(r) => r.write_to(buf),
            Self::TXT(r) => r.write_to(buf),
            Self::SRV(r) => r.write_to(buf),
            Self::SVCB(r) => r.write_to(buf),
            Self::HTTPS(r) => r.write_to(buf),
            Self::Unknown(r) => r.write_to(buf),
        }
    }

    /// Returns the IPv4 address if this is an A record.
    pub fn as_a(&self) -> Option<Ipv4Addr> {
        match self {
            Self::A(a) => Some(a.address()),
            _ => None,
        }
    }

    /// Returns the IPv6 address if this is an AAAA record.
    pub fn as_aaaa(&self) -> Option<Ipv6Addr> {
        match self {
            Self::AAAA(aaaa) => Some(aaaa.address()),
            _ => None,
        }
    }

    /// Returns the address for A or AAAA records.
    pub fn as_ip(&self) -> Option<std::net::IpAddr> {
        match self {
            Self::A(a) => Some(a.address().into()),
            Self::AAAA(aaaa) => Some(aaaa.address().into()),
            _ => None,
        }
    }

    /// Returns the target name if this is a CNAME record.
    pub fn as_cname(&self) -> Option<&Name> {
        match self {
            Self::CNAME(cname) => Some(cname.target()),
            _ => None,
        }
    }

    /// Returns the pointer target if this is a PTR record.
    pub fn as_ptr(&self) -> Option<&Name> {
        match self {
            Self::PTR(ptr) => Some(ptr.ptrdname()),
            _ => None,
        }
    }

    /// Returns the SRV payload if this is an SRV record.
    pub fn as_srv(&self) -> Option<&SRV> {
        match self {
            Self::SRV(srv) => Some(srv),
            _ => None,
        }
    }

    /// Returns the TXT payload if this is a TXT record.
    pub fn as_txt(&self) -> Option<&TXT> {
        match self {
            Self::TXT(txt) => Some(txt),
            _ => None,
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(r) => write!(f, "{r}"),
            Self::AAAA(r) => write!(f, "{r}"),
            Self::NS(r) => write!(f, "{r}"),
            Self::CNAME(r) => write!(f, "{r}"),
            Self::DNAME(r) => write!(f, "{r}"),
            Self::PTR(r) => write!(f, "{r}"),
            Self::SOA(r) => write!(f, "{r}"),
            Self::TXT(r) => write!(f, "{r}"),
            Self::SRV(r) => write!(f, "{r}"),
            Self::SVCB(r) => write!(f, "{r}"),
            Self::HTTPS(r) => write!(f, "{r}"),
            Self::Unknown(r) => write!(f, "{r}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_dispatch_known() {
        let rdata = RData::parse(Type::Known(RecordType::A), &[93, 184, 216, 34], 0, 4).unwrap();
        assert_eq!(rdata.as_a(), Some(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(rdata.record_type(), Type::Known(RecordType::A));
    }

    #[test]
    fn test_dispatch_unknown() {
        let rdata = RData::parse(Type::Unknown(4242), &[1, 2, 3], 0, 3).unwrap();
        match &rdata {
            RData::Unknown(u) => {
                assert_eq!(u.type_code(), 4242);
                assert_eq!(u.data(), &[1, 2, 3]);
            }
            other => panic!("expected opaque rdata, got {other:?}"),
        }
    }

    #[test]
    fn test_opt_is_opaque() {
        let rdata = RData::parse(Type::Known(RecordType::OPT), &[], 0, 0).unwrap();
        assert!(matches!(rdata, RData::Unknown(_)));
    }

    #[test]
    fn test_as_ip() {
        let a = RData::A(A::new(Ipv4Addr::LOCALHOST));
        let aaaa = RData::AAAA(AAAA::new(Ipv6Addr::LOCALHOST));
        let ptr = RData::PTR(PTR::new(Name::from_str("x.local").unwrap()));

        assert!(a.as_ip().unwrap().is_ipv4());
        assert!(aaaa.as_ip().unwrap().is_ipv6());
        assert!(ptr.as_ip().is_none());
    }
}
