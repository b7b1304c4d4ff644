//! Service record types (SRV, SVCB, HTTPS).

use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use bytes::BytesMut;
use std::collections::BTreeMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// SRV record - service locator (RFC 2782).
///
/// In DNS-SD this is the record that carries the host and port of a
/// service instance (RFC 6763 Section 5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SRV {
    /// Priority (lower is more preferred).
    priority: u16,
    /// Weight for load balancing among equal priority.
    weight: u16,
    /// TCP/UDP port number.
    port: u16,
    /// Target host name.
    target: Name,
}

impl SRV {
    /// Creates a new SRV record.
    pub const fn new(priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Self {
            priority,
            weight,
            port,
            target,
        }
    }

    /// Returns the priority (lower = more preferred).
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the weight for load balancing.
    #[inline]
    pub const fn weight(&self) -> u16 {
        self.weight
    }

    /// Returns the port number.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the target host name.
    #[inline]
    pub fn target(&self) -> &Name {
        &self.target
    }

    /// Returns true if the service is explicitly unavailable (target `.`).
    pub fn is_unavailable(&self) -> bool {
        self.target.is_root()
    }

    /// Parses an SRV record starting at `offset` in `message`.
    pub fn parse(message: &[u8], offset: usize) -> Result<Self> {
        if offset + 6 > message.len() {
            return Err(Error::buffer_too_short(offset + 6, message.len()));
        }

        let priority = u16::from_be_bytes([message[offset], message[offset + 1]]);
        let weight = u16::from_be_bytes([message[offset + 2], message[offset + 3]]);
        let port = u16::from_be_bytes([message[offset + 4], message[offset + 5]]);

        let parser = NameParser::new(message);
        let (target, _) = parser.parse_name(offset + 6)?;

        Ok(Self {
            priority,
            weight,
            port,
            target,
        })
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        6 + self.target.wire_len()
    }

    /// Writes the RDATA to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.priority.to_be_bytes());
        buf.extend_from_slice(&self.weight.to_be_bytes());
        buf.extend_from_slice(&self.port.to_be_bytes());
        self.target.write_wire(buf);
    }
}

impl fmt::Display for SRV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}

/// Well-known SVCB/HTTPS service parameter keys (RFC 9460, RFC 9461,
/// RFC 9540).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum SvcParamKey {
    /// Keys the client must understand for the record to be usable.
    Mandatory = 0,
    /// Application Layer Protocol Negotiation identifiers.
    Alpn = 1,
    /// No default ALPN.
    NoDefaultAlpn = 2,
    /// Alternative port.
    Port = 3,
    /// IPv4 address hints.
    Ipv4Hint = 4,
    /// Encrypted ClientHello configuration.
    Ech = 5,
    /// IPv6 address hints.
    Ipv6Hint = 6,
    /// DoH URI path template (RFC 9461).
    DohPath = 7,
    /// Oblivious HTTP support (RFC 9540).
    Ohttp = 8,
    /// Reserved invalid key, carried opaquely.
    InvalidKey = 255,
}

impl SvcParamKey {
    /// Creates a key from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Mandatory),
            1 => Some(Self::Alpn),
            2 => Some(Self::NoDefaultAlpn),
            3 => Some(Self::Port),
            4 => Some(Self::Ipv4Hint),
            5 => Some(Self::Ech),
            6 => Some(Self::Ipv6Hint),
            7 => Some(Self::DohPath),
            8 => Some(Self::Ohttp),
            255 => Some(Self::InvalidKey),
            _ => None,
        }
    }
}

/// A decoded service parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SvcParamValue {
    /// Keys the client must understand.
    Mandatory(Vec<u16>),
    /// ALPN protocol identifiers.
    Alpn(Vec<Vec<u8>>),
    /// No default ALPN (empty value).
    NoDefaultAlpn,
    /// Alternative port.
    Port(u16),
    /// IPv4 address hints.
    Ipv4Hint(Vec<Ipv4Addr>),
    /// Encrypted ClientHello configuration, opaque.
    Ech(Vec<u8>),
    /// IPv6 address hints.
    Ipv6Hint(Vec<Ipv6Addr>),
    /// DoH URI path template.
    DohPath(Vec<u8>),
    /// Oblivious HTTP support (empty value).
    Ohttp,
    /// Unknown or reserved key, carried opaquely.
    Opaque(Vec<u8>),
}

impl SvcParamValue {
    /// Parses a parameter value for `key` from its value bytes.
    fn parse(key: u16, value: &[u8]) -> Result<Self> {
        let rtype = "SVCB";
        match SvcParamKey::from_u16(key) {
            Some(SvcParamKey::Mandatory) => {
                if value.len() % 2 != 0 {
                    return Err(Error::invalid_rdata(rtype, "odd mandatory list length"));
                }
                let keys = value
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                Ok(Self::Mandatory(keys))
            }
            Some(SvcParamKey::Alpn) => {
                let mut ids = Vec::new();
                let mut pos = 0;
                while pos < value.len() {
                    let len = value[pos] as usize;
                    pos += 1;
                    if pos + len > value.len() {
                        return Err(Error::invalid_rdata(rtype, "alpn id overruns value"));
                    }
                    ids.push(value[pos..pos + len].to_vec());
                    pos += len;
                }
                Ok(Self::Alpn(ids))
            }
            Some(SvcParamKey::NoDefaultAlpn) => {
                if !value.is_empty() {
                    return Err(Error::invalid_rdata(rtype, "no-default-alpn carries data"));
                }
                Ok(Self::NoDefaultAlpn)
            }
            Some(SvcParamKey::Port) => {
                let bytes: [u8; 2] = value
                    .try_into()
                    .map_err(|_| Error::invalid_rdata(rtype, "port value is not 2 bytes"))?;
                Ok(Self::Port(u16::from_be_bytes(bytes)))
            }
            Some(SvcParamKey::Ipv4Hint) => {
                if value.is_empty() || value.len() % 4 != 0 {
                    return Err(Error::invalid_rdata(rtype, "bad ipv4hint length"));
                }
                let addrs = value
                    .chunks_exact(4)
                    .map(|c| Ipv4Addr::new(c[0], c[1], c[2], c[3]))
                    .collect();
                Ok(Self::Ipv4Hint(addrs))
            }
            Some(SvcParamKey::Ech) => Ok(Self::Ech(value.to_vec())),
            Some(SvcParamKey::Ipv6Hint) => {
                if value.is_empty() || value.len() % 16 != 0 {
                    return Err(Error::invalid_rdata(rtype, "bad ipv6hint length"));
                }
                let addrs = value
                    .chunks_exact(16)
                    .map(|c| {
                        let octets: [u8; 16] = c.try_into().unwrap();
                        Ipv6Addr::from(octets)
                    })
                    .collect();
                Ok(Self::Ipv6Hint(addrs))
            }
            Some(SvcParamKey::DohPath) => Ok(Self::DohPath(value.to_vec())),
            Some(SvcParamKey::Ohttp) => {
                if !value.is_empty() {
                    return Err(Error::invalid_rdata(rtype, "ohttp carries data"));
                }
                Ok(Self::Ohttp)
            }
            Some(SvcParamKey::InvalidKey) | None => Ok(Self::Opaque(value.to_vec())),
        }
    }

    /// Returns the wire length of the value bytes.
    fn value_len(&self) -> usize {
        match self {
            Self::Mandatory(keys) => keys.len() * 2,
            Self::Alpn(ids) => ids.iter().map(|i| 1 + i.len()).sum(),
            Self::NoDefaultAlpn | Self::Ohttp => 0,
            Self::Port(_) => 2,
            Self::Ipv4Hint(addrs) => addrs.len() * 4,
            Self::Ech(data) | Self::DohPath(data) | Self::Opaque(data) => data.len(),
            Self::Ipv6Hint(addrs) => addrs.len() * 16,
        }
    }

    /// Writes the value bytes.
    fn write_value(&self, buf: &mut BytesMut) {
        match self {
            Self::Mandatory(keys) => {
                for k in keys {
                    buf.extend_from_slice(&k.to_be_bytes());
                }
            }
            Self::Alpn(ids) => {
                for id in ids {
                    buf.extend_from_slice(&[id.len() as u8]);
                    buf.extend_from_slice(id);
                }
            }
            Self::NoDefaultAlpn | Self::Ohttp => {}
            Self::Port(port) => buf.extend_from_slice(&port.to_be_bytes()),
            Self::Ipv4Hint(addrs) => {
                for a in addrs {
                    buf.extend_from_slice(&a.octets());
                }
            }
            Self::Ech(data) | Self::DohPath(data) | Self::Opaque(data) => {
                buf.extend_from_slice(data);
            }
            Self::Ipv6Hint(addrs) => {
                for a in addrs {
                    buf.extend_from_slice(&a.octets());
                }
            }
        }
    }
}

/// SVCB record - general service binding (RFC 9460).
///
/// Priority 0 is alias mode; greater values are service mode with an
/// ordered parameter map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SVCB {
    /// Priority (0 = alias mode).
    priority: u16,
    /// Target name.
    target: Name,
    /// Service parameters, keyed by numeric parameter key.
    params: BTreeMap<u16, SvcParamValue>,
}

impl SVCB {
    /// Creates a new SVCB record.
    pub const fn new(priority: u16, target: Name, params: BTreeMap<u16, SvcParamValue>) -> Self {
        Self {
            priority,
            target,
            params,
        }
    }

    /// Creates an alias-mode record (priority 0, no parameters).
    pub fn alias(target: Name) -> Self {
        Self::new(0, target, BTreeMap::new())
    }

    /// Returns the priority.
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns true if this is alias mode.
    #[inline]
    pub const fn is_alias(&self) -> bool {
        self.priority == 0
    }

    /// Returns the target name.
    #[inline]
    pub fn target(&self) -> &Name {
        &self.target
    }

    /// Returns the service parameters, ordered by key.
    #[inline]
    pub fn params(&self) -> &BTreeMap<u16, SvcParamValue> {
        &self.params
    }

    /// Returns a parameter by well-known key.
    pub fn param(&self, key: SvcParamKey) -> Option<&SvcParamValue> {
        self.params.get(&(key as u16))
    }

    /// Parses an SVCB record covering exactly `rdlength` bytes.
    pub fn parse(message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        let end = offset + rdlength as usize;
        if end > message.len() || offset + 2 > end {
            return Err(Error::buffer_too_short(end, message.len()));
        }

        let priority = u16::from_be_bytes([message[offset], message[offset + 1]]);

        let parser = NameParser::new(message);
        let (target, target_len) = parser.parse_name(offset + 2)?;

        let mut pos = offset + 2 + target_len;
        let mut params = BTreeMap::new();

        // (key, len, value) triplets until the declared RDATA is exhausted
        while pos < end {
            if pos + 4 > end {
                return Err(Error::invalid_rdata("SVCB", "dangling parameter header"));
            }
            let key = u16::from_be_bytes([message[pos], message[pos + 1]]);
            let len = u16::from_be_bytes([message[pos + 2], message[pos + 3]]) as usize;
            pos += 4;

            if pos + len > end {
                return Err(Error::invalid_rdata("SVCB", "parameter overruns RDATA"));
            }
            let value = SvcParamValue::parse(key, &message[pos..pos + len])?;
            params.insert(key, value);
            pos += len;
        }

        if pos != end {
            return Err(Error::RDataLengthMismatch {
                rtype: "SVCB".into(),
                declared: rdlength as usize,
                consumed: pos - offset,
            });
        }

        Ok(Self {
            priority,
            target,
            params,
        })
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        2 + self.target.wire_len()
            + self
                .params
                .values()
                .map(|v| 4 + v.value_len())
                .sum::<usize>()
    }

    /// Writes the RDATA to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.priority.to_be_bytes());
        self.target.write_wire(buf);
        for (key, value) in &self.params {
            buf.extend_from_slice(&key.to_be_bytes());
            buf.extend_from_slice(&(value.value_len() as u16).to_be_bytes());
            value.write_value(buf);
        }
    }
}

impl fmt::Display for SVCB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.priority, self.target)?;
        for (key, value) in &self.params {
            write!(f, " key{key}={value:?}")?;
        }
        Ok(())
    }
}

/// HTTPS record - service binding for HTTPS endpoints (RFC 9460).
///
/// Wire-identical to SVCB; the distinct type carries HTTP-specific
/// defaulting rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HTTPS(pub SVCB);

impl HTTPS {
    /// Returns the inner service binding.
    #[inline]
    pub const fn svcb(&self) -> &SVCB {
        &self.0
    }

    /// Parses an HTTPS record covering exactly `rdlength` bytes.
    pub fn parse(message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        SVCB::parse(message, offset, rdlength).map(Self)
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        self.0.wire_len()
    }

    /// Writes the RDATA to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.0.write_to(buf);
    }
}

impl fmt::Display for HTTPS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
