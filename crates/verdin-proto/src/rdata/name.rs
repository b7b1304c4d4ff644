//! Record types whose RDATA is a single domain name (NS, CNAME, DNAME, PTR).

use crate::error::Result;
use crate::name::{Name, NameParser};
use bytes::BytesMut;
use std::fmt;

macro_rules! single_name_rdata {
    ($(#[$doc:meta])* $ty:ident, $getter:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $ty {
            target: Name,
        }

        impl $ty {
            /// Creates a new record from its target name.
            #[inline]
            pub const fn new(target: Name) -> Self {
                Self { target }
            }

            /// Returns the target name.
            #[inline]
            pub fn $getter(&self) -> &Name {
                &self.target
            }

            /// Parses the RDATA; names inside RDATA may use compression,
            /// so the whole message is required.
            pub fn parse(message: &[u8], offset: usize) -> Result<Self> {
                let parser = NameParser::new(message);
                let (target, _) = parser.parse_name(offset)?;
                Ok(Self { target })
            }

            /// Returns the wire format length (written uncompressed).
            #[inline]
            pub fn wire_len(&self) -> usize {
                self.target.wire_len()
            }

            /// Writes the RDATA to wire format.
            pub fn write_to(&self, buf: &mut BytesMut) {
                self.target.write_wire(buf);
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.target)
            }
        }
    };
}

single_name_rdata!(
    /// NS record - authoritative name server (RFC 1035).
    NS,
    nsdname
);

single_name_rdata!(
    /// CNAME record - canonical name alias (RFC 1035).
    CNAME,
    target
);

single_name_rdata!(
    /// DNAME record - delegation of a whole subtree (RFC 6672).
    DNAME,
    target
);

single_name_rdata!(
    /// PTR record - domain name pointer (RFC 1035); carries service
    /// instance names in DNS-SD (RFC 6763).
    PTR,
    ptrdname
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cname_roundtrip() {
        let cname = CNAME::new(Name::from_str("canonical.example.com").unwrap());

        let mut buf = BytesMut::new();
        cname.write_to(&mut buf);
        assert_eq!(buf.len(), cname.wire_len());

        let parsed = CNAME::parse(&buf, 0).unwrap();
        assert_eq!(parsed, cname);
    }

    #[test]
    fn test_ptr_compressed_target() {
        // Message: name at 0, then a PTR rdata that is just a pointer
        let mut buf = BytesMut::new();
        Name::from_str("_http._tcp.local")
            .unwrap()
            .write_wire(&mut buf);
        let rdata_offset = buf.len();
        buf.extend_from_slice(&[0xC0, 0x00]);

        let ptr = PTR::parse(&buf, rdata_offset).unwrap();
        assert_eq!(ptr.ptrdname().to_string(), "_http._tcp.local.");
    }

    #[test]
    fn test_ns_display() {
        let ns = NS::new(Name::from_str("ns1.example.net").unwrap());
        assert_eq!(ns.to_string(), "ns1.example.net.");
    }
}
