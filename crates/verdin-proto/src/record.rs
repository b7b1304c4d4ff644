//! DNS resource records.
//!
//! A record's TTL is resolved into an absolute expiry instant the moment
//! it is parsed or constructed; from then on the clock only shrinks its
//! remaining lifetime. The creation instant and the stale flag exist for
//! the passive cache (curator marking, known-answer selection).

use crate::class::Class;
use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use crate::rdata::RData;
use crate::rtype::{RecordType, Type};
use bytes::BytesMut;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

/// A DNS resource record.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                      NAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |CF|                  CLASS                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TTL                      |
/// |                                               |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                   RDLENGTH                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     RDATA                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// `CF` is the mDNS cache-flush bit (RFC 6762 Section 10.2).
///
/// # Equality
///
/// Two records are equal when their (owner name, type, RDATA) agree;
/// the owner comparison is case-insensitive. TTL, timestamps, the stale
/// flag, and the cache-flush bit are metadata and excluded. `Hash`
/// agrees with `Eq`.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    /// The owner name.
    name: Name,
    /// The record type.
    rtype: Type,
    /// The record class (top bit stripped).
    rclass: Class,
    /// mDNS cache-flush bit.
    cache_flush: bool,
    /// Original time to live in seconds.
    ttl: u32,
    /// When this record was parsed or constructed.
    created_at: Instant,
    /// Absolute expiry, fixed at parse time.
    expires_at: Instant,
    /// Marked by the cache curator when a refresh is due.
    stale: bool,
    /// The record data.
    rdata: RData,
}

impl ResourceRecord {
    /// Creates a new resource record; the expiry clock starts now.
    pub fn new(name: Name, ttl: u32, rdata: RData) -> Self {
        Self::new_at(name, ttl, rdata, Instant::now())
    }

    /// Creates a resource record with an explicit creation instant, for
    /// callers that track their own clock.
    pub fn new_at(name: Name, ttl: u32, rdata: RData, now: Instant) -> Self {
        let rtype = rdata.record_type();
        Self {
            name,
            rtype,
            rclass: Class::default(),
            cache_flush: false,
            ttl,
            created_at: now,
            expires_at: now + Duration::from_secs(u64::from(ttl)),
            stale: false,
            rdata,
        }
    }

    /// Creates an A record.
    pub fn a(name: Name, ttl: u32, addr: std::net::Ipv4Addr) -> Self {
        Self::new(name, ttl, RData::A(crate::rdata::A::new(addr)))
    }

    /// Creates an AAAA record.
    pub fn aaaa(name: Name, ttl: u32, addr: std::net::Ipv6Addr) -> Self {
        Self::new(name, ttl, RData::AAAA(crate::rdata::AAAA::new(addr)))
    }

    /// Creates a CNAME record.
    pub fn cname(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(name, ttl, RData::CNAME(crate::rdata::CNAME::new(target)))
    }

    /// Creates a PTR record.
    pub fn ptr(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(name, ttl, RData::PTR(crate::rdata::PTR::new(target)))
    }

    /// Creates a TXT record from a single string.
    pub fn txt(name: Name, ttl: u32, text: impl Into<Vec<u8>>) -> Self {
        Self::new(name, ttl, RData::TXT(crate::rdata::TXT::single(text)))
    }

    /// Creates an SRV record.
    pub fn srv(name: Name, ttl: u32, priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Self::new(
            name,
            ttl,
            RData::SRV(crate::rdata::SRV::new(priority, weight, port, target)),
        )
    }

    /// Returns the owner name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type tag.
    #[inline]
    pub fn rtype(&self) -> Type {
        self.rtype
    }

    /// Returns the record type if known.
    #[inline]
    pub fn record_type(&self) -> Option<RecordType> {
        self.rtype.as_known()
    }

    /// Returns the record class.
    #[inline]
    pub fn rclass(&self) -> Class {
        self.rclass
    }

    /// Returns true if the mDNS cache-flush bit is set.
    #[inline]
    pub const fn cache_flush(&self) -> bool {
        self.cache_flush
    }

    /// Returns a copy with the cache-flush bit set.
    #[must_use]
    pub fn with_cache_flush(mut self, flush: bool) -> Self {
        self.cache_flush = flush;
        self
    }

    /// Returns the original TTL in seconds.
    #[inline]
    pub const fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns when this record was parsed or constructed.
    #[inline]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns the absolute expiry instant.
    #[inline]
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns true if the record has expired at `now`.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Returns the remaining lifetime at `now` (zero once expired).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Returns the remaining TTL in whole seconds at `now`.
    pub fn remaining_ttl(&self, now: Instant) -> u32 {
        self.remaining(now).as_secs() as u32
    }

    /// Returns the fraction of the record's lifetime still ahead at
    /// `now`, in `0.0..=1.0`.
    ///
    /// The curator marks records stale below 1/8; known-answer
    /// suppression requires more than 1/2.
    pub fn lifetime_fraction(&self, now: Instant) -> f64 {
        let total = self.expires_at.duration_since(self.created_at);
        if total.is_zero() {
            return 0.0;
        }
        self.remaining(now).as_secs_f64() / total.as_secs_f64()
    }

    /// Returns true if the curator has marked this record for refresh.
    #[inline]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Marks or clears the stale flag.
    #[inline]
    pub fn set_stale(&mut self, stale: bool) {
        self.stale = stale;
    }

    /// Returns the record data.
    #[inline]
    pub fn rdata(&self) -> &RData {
        &self.rdata
    }

    /// Returns a copy whose TTL field reflects the remaining lifetime,
    /// for synthesizing responses out of the cache.
    #[must_use]
    pub fn with_remaining_ttl(&self, now: Instant) -> Self {
        let mut record = self.clone();
        record.ttl = self.remaining_ttl(now);
        record
    }

    /// Parses a resource record from wire format.
    ///
    /// `now` anchors the expiry instant. Returns the record and the
    /// number of bytes consumed.
    pub fn parse(data: &[u8], offset: usize, now: Instant) -> Result<(Self, usize)> {
        let parser = NameParser::new(data);
        let (name, name_len) = parser.parse_name(offset)?;

        let fixed = offset + name_len;
        if fixed + 10 > data.len() {
            return Err(Error::buffer_too_short(fixed + 10, data.len()));
        }

        let rtype_value = u16::from_be_bytes([data[fixed], data[fixed + 1]]);
        let rclass_raw = u16::from_be_bytes([data[fixed + 2], data[fixed + 3]]);
        let ttl = u32::from_be_bytes(data[fixed + 4..fixed + 8].try_into().unwrap());
        let rdlength = u16::from_be_bytes([data[fixed + 8], data[fixed + 9]]);

        let rdata_start = fixed + 10;
        if rdata_start + rdlength as usize > data.len() {
            return Err(Error::buffer_too_short(
                rdata_start + rdlength as usize,
                data.len(),
            ));
        }

        let rtype = Type::from_u16(rtype_value);
        let (rclass, cache_flush) = Class::from_wire(rclass_raw);
        let rdata = RData::parse(rtype, data, rdata_start, rdlength)?;

        Ok((
            Self {
                name,
                rtype,
                rclass,
                cache_flush,
                ttl,
                created_at: now,
                expires_at: now + Duration::from_secs(u64::from(ttl)),
                stale: false,
                rdata,
            },
            name_len + 10 + rdlength as usize,
        ))
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.rdata.wire_len()
    }

    /// Writes the resource record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.name.write_wire(buf);
        buf.extend_from_slice(&self.rtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.rclass.to_wire(self.cache_flush).to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.rdata.wire_len() as u16).to_be_bytes());
        self.rdata.write_to(buf);
    }

    /// Converts the record to wire format bytes.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.write_to(&mut buf);
        buf.to_vec()
    }
}

impl PartialEq for ResourceRecord {
    /// Payload-aware equality: (owner, type, RDATA) only.
    fn eq(&self, other: &Self) -> bool {
        self.rtype == other.rtype && self.name == other.name && self.rdata == other.rdata
    }
}

impl Eq for ResourceRecord {}

impl Hash for ResourceRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.rtype.hash(state);
        self.rdata.hash(state);
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.rclass, self.rtype, self.rdata
        )
    }
}

/// Parser for resource record sections.
#[derive(Debug)]
pub struct RecordParser<'a> {
    /// The message data.
    data: &'a [u8],
    /// Current offset in the message.
    offset: usize,
    /// Number of records remaining.
    remaining: u16,
    /// Parse instant shared by all records of the message.
    now: Instant,
}

impl<'a> RecordParser<'a> {
    /// Creates a new record parser.
    #[inline]
    pub const fn new(data: &'a [u8], offset: usize, count: u16, now: Instant) -> Self {
        Self {
            data,
            offset,
            remaining: count,
            now,
        }
    }

    /// Returns the current offset.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Parses the next record.
    pub fn next(&mut self) -> Result<Option<ResourceRecord>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let (record, consumed) = ResourceRecord::parse(self.data, self.offset, self.now)?;
        self.offset += consumed;
        self.remaining -= 1;

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    #[test]
    fn test_a_record_roundtrip() {
        let name = Name::from_str("example.com").unwrap();
        let original = ResourceRecord::a(name, 300, Ipv4Addr::new(93, 184, 216, 34));

        let wire = original.to_wire();
        let (parsed, consumed) = ResourceRecord::parse(&wire, 0, Instant::now()).unwrap();

        assert_eq!(consumed, wire.len());
        assert_eq!(original, parsed);
        assert_eq!(parsed.rdata().as_a(), Some(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(parsed.ttl(), 300);
    }

    #[test]
    fn test_cache_flush_bit_roundtrip() {
        let name = Name::from_str("host.local").unwrap();
        let record =
            ResourceRecord::a(name, 120, Ipv4Addr::new(169, 254, 1, 2)).with_cache_flush(true);

        let wire = record.to_wire();
        let (parsed, _) = ResourceRecord::parse(&wire, 0, Instant::now()).unwrap();

        assert!(parsed.cache_flush());
        // Flush bit is metadata: records still compare equal
        assert_eq!(parsed, record.clone().with_cache_flush(false));
    }

    #[test]
    fn test_equality_ignores_ttl() {
        let name = Name::from_str("example.com").unwrap();
        let r1 = ResourceRecord::a(name.clone(), 300, Ipv4Addr::new(192, 0, 2, 1));
        let r2 = ResourceRecord::a(name.clone(), 9000, Ipv4Addr::new(192, 0, 2, 1));
        let r3 = ResourceRecord::a(name, 300, Ipv4Addr::new(192, 0, 2, 2));

        assert_eq!(r1, r2);
        assert_ne!(r1, r3);
    }

    #[test]
    fn test_equality_case_insensitive_owner() {
        let r1 = ResourceRecord::a(
            Name::from_str("Host.Local").unwrap(),
            60,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        let r2 = ResourceRecord::a(
            Name::from_str("host.local").unwrap(),
            60,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_expiry_math() {
        let now = Instant::now();
        let record = ResourceRecord::new_at(
            Name::from_str("example.com").unwrap(),
            100,
            RData::A(crate::rdata::A::new(Ipv4Addr::new(192, 0, 2, 1))),
            now,
        );

        assert!(!record.is_expired(now));
        assert_eq!(record.remaining_ttl(now), 100);

        let mid = now + Duration::from_secs(50);
        assert_eq!(record.remaining_ttl(mid), 50);
        assert!((record.lifetime_fraction(mid) - 0.5).abs() < 0.01);

        let past = now + Duration::from_secs(101);
        assert!(record.is_expired(past));
        assert_eq!(record.remaining_ttl(past), 0);
        assert_eq!(record.lifetime_fraction(past), 0.0);
    }

    #[test]
    fn test_with_remaining_ttl() {
        let now = Instant::now();
        let record = ResourceRecord::new_at(
            Name::from_str("example.com").unwrap(),
            100,
            RData::A(crate::rdata::A::new(Ipv4Addr::new(192, 0, 2, 1))),
            now,
        );

        let later = now + Duration::from_secs(40);
        assert_eq!(record.with_remaining_ttl(later).ttl(), 60);
    }

    #[test]
    fn test_compressed_owner_name() {
        // Owner name is a pointer into an earlier part of the message
        let mut buf = BytesMut::new();
        Name::from_str("host.local").unwrap().write_wire(&mut buf);
        let record_start = buf.len();
        buf.extend_from_slice(&[0xC0, 0x00]); // owner = ptr to 0
        buf.extend_from_slice(&1u16.to_be_bytes()); // type A
        buf.extend_from_slice(&1u16.to_be_bytes()); // class IN
        buf.extend_from_slice(&60u32.to_be_bytes());
        buf.extend_from_slice(&4u16.to_be_bytes());
        buf.extend_from_slice(&[10, 0, 0, 7]);

        let (record, consumed) =
            ResourceRecord::parse(&buf, record_start, Instant::now()).unwrap();
        assert_eq!(record.name().to_string(), "host.local.");
        assert_eq!(consumed, 2 + 10 + 4);
        assert_eq!(record.rdata().as_a(), Some(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn test_rdlength_overflow_rejected() {
        let mut buf = BytesMut::new();
        Name::from_str("x.local").unwrap().write_wire(&mut buf);
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&60u32.to_be_bytes());
        buf.extend_from_slice(&200u16.to_be_bytes()); // declares more than present
        buf.extend_from_slice(&[1, 2, 3, 4]);

        assert!(ResourceRecord::parse(&buf, 0, Instant::now()).is_err());
    }
}
