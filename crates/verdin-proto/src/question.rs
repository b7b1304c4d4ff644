//! DNS question section.

use crate::class::{Class, RecordClass};
use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use crate::rtype::{RecordType, Type};
use bytes::BytesMut;
use std::fmt;

/// A DNS question.
///
/// In multicast DNS the top bit of the class field is the
/// unicast-response bit (RFC 6762 Section 5.4): the querier asks
/// responders to reply by unicast instead of flooding the group.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     QNAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     QTYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QU|                  QCLASS                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    /// The domain name being queried.
    pub qname: Name,

    /// The type of record being requested.
    pub qtype: Type,

    /// The class of the query (usually IN).
    pub qclass: Class,

    /// mDNS unicast-response bit.
    pub unicast_response: bool,
}

impl Question {
    /// Creates a new question.
    #[inline]
    pub fn new(qname: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Self {
            qname,
            qtype: Type::Known(qtype),
            qclass: Class::Known(qclass),
            unicast_response: false,
        }
    }

    /// Creates a question for an A record lookup.
    #[inline]
    pub fn a(name: Name) -> Self {
        Self::new(name, RecordType::A, RecordClass::IN)
    }

    /// Creates a question for an AAAA record lookup.
    #[inline]
    pub fn aaaa(name: Name) -> Self {
        Self::new(name, RecordType::AAAA, RecordClass::IN)
    }

    /// Creates a question for a PTR (reverse / service enumeration) lookup.
    #[inline]
    pub fn ptr(name: Name) -> Self {
        Self::new(name, RecordType::PTR, RecordClass::IN)
    }

    /// Creates a question for an SRV lookup.
    #[inline]
    pub fn srv(name: Name) -> Self {
        Self::new(name, RecordType::SRV, RecordClass::IN)
    }

    /// Creates a question for a TXT lookup.
    #[inline]
    pub fn txt(name: Name) -> Self {
        Self::new(name, RecordType::TXT, RecordClass::IN)
    }

    /// Returns a copy with the unicast-response bit set.
    #[must_use]
    pub fn with_unicast_response(mut self, unicast: bool) -> Self {
        self.unicast_response = unicast;
        self
    }

    /// Returns the record type if known.
    #[inline]
    pub fn record_type(&self) -> Option<RecordType> {
        self.qtype.as_known()
    }

    /// Returns true if this is an A or AAAA query.
    #[inline]
    pub fn is_address_query(&self) -> bool {
        matches!(
            self.qtype,
            Type::Known(RecordType::A) | Type::Known(RecordType::AAAA)
        )
    }

    /// Parses a question from wire format.
    ///
    /// Returns the question and the number of bytes consumed.
    pub fn parse(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let parser = NameParser::new(data);
        let (qname, name_len) = parser.parse_name(offset)?;

        let fixed = offset + name_len;
        if fixed + 4 > data.len() {
            return Err(Error::buffer_too_short(fixed + 4, data.len()));
        }

        let qtype_value = u16::from_be_bytes([data[fixed], data[fixed + 1]]);
        let qclass_raw = u16::from_be_bytes([data[fixed + 2], data[fixed + 3]]);
        let (qclass, unicast_response) = Class::from_wire(qclass_raw);

        Ok((
            Self {
                qname,
                qtype: Type::from_u16(qtype_value),
                qclass,
                unicast_response,
            },
            name_len + 4,
        ))
    }

    /// Returns the wire format length of this question.
    pub fn wire_len(&self) -> usize {
        self.qname.wire_len() + 4
    }

    /// Writes the question to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.qname.write_wire(buf);
        buf.extend_from_slice(&self.qtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_wire(self.unicast_response).to_be_bytes());
    }

    /// Returns true if a record of `(name, rtype)` answers this question.
    pub fn is_answered_by(&self, name: &Name, rtype: Type) -> bool {
        if &self.qname != name {
            return false;
        }

        if self.qtype.to_u16() == rtype.to_u16() {
            return true;
        }

        if matches!(self.qtype, Type::Known(RecordType::ANY)) {
            return true;
        }

        // A CNAME stands in for the address it aliases
        if self.is_address_query() && matches!(rtype, Type::Known(RecordType::CNAME)) {
            return true;
        }

        false
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)?;
        if self.unicast_response {
            write!(f, " QU")?;
        }
        Ok(())
    }
}

/// Parser for the question section.
#[derive(Debug)]
pub struct QuestionParser<'a> {
    /// The message data.
    data: &'a [u8],
    /// Current offset in the message.
    offset: usize,
    /// Number of questions remaining.
    remaining: u16,
}

impl<'a> QuestionParser<'a> {
    /// Creates a new question parser.
    #[inline]
    pub const fn new(data: &'a [u8], offset: usize, count: u16) -> Self {
        Self {
            data,
            offset,
            remaining: count,
        }
    }

    /// Returns the current offset.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Parses the next question.
    pub fn next(&mut self) -> Result<Option<Question>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let (question, consumed) = Question::parse(self.data, self.offset)?;
        self.offset += consumed;
        self.remaining -= 1;

        Ok(Some(question))
    }
}
