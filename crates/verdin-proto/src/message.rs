//! DNS message representation.
//!
//! A message is the 12-byte header plus four ordered sections:
//! questions, answers, authorities, additionals.

use crate::error::{Error, Result};
use crate::header::{HEADER_SIZE, Header};
use crate::name::Name;
use crate::opcode::OpCode;
use crate::question::{Question, QuestionParser};
use crate::rcode::ResponseCode;
use crate::record::{RecordParser, ResourceRecord};
use crate::rtype::RecordType;
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::time::Instant;

/// A complete DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message header.
    header: Header,
    /// The question section.
    questions: Vec<Question>,
    /// The answer section.
    answers: Vec<ResourceRecord>,
    /// The authority section.
    authorities: Vec<ResourceRecord>,
    /// The additional section.
    additionals: Vec<ResourceRecord>,
}

impl Message {
    /// Creates a new empty message with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Creates a unicast query message (random id, RD set).
    pub fn query(question: Question) -> Self {
        let mut msg = Self::new(Header::query());
        msg.header.qd_count = 1;
        msg.questions.push(question);
        msg
    }

    /// Creates a multicast query message (id 0, RD and RA clear, per
    /// RFC 6762 Section 18).
    pub fn multicast_query(question: Question) -> Self {
        let mut msg = Self::new(Header::multicast_query());
        msg.questions.push(question);
        msg
    }

    /// Creates a response message mirroring a query.
    pub fn response_from(query: &Message) -> Self {
        let mut msg = Self::new(Header::response_from(&query.header));
        msg.questions = query.questions.clone();
        msg
    }

    // =========================================================================
    // Header accessors
    // =========================================================================

    /// Returns the message header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns a mutable reference to the header.
    #[inline]
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Returns the message ID.
    #[inline]
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Sets the message ID.
    #[inline]
    pub fn set_id(&mut self, id: u16) {
        self.header.id = id;
    }

    /// Returns the opcode.
    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.header.opcode
    }

    /// Returns the response code.
    #[inline]
    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    /// Sets the response code.
    #[inline]
    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode;
    }

    /// Returns true if this is a query.
    #[inline]
    pub fn is_query(&self) -> bool {
        self.header.is_query()
    }

    /// Returns true if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.header.is_response()
    }

    /// Returns true if recursion is available at the responder.
    #[inline]
    pub fn recursion_available(&self) -> bool {
        self.header.recursion_available()
    }

    // =========================================================================
    // Section accessors
    // =========================================================================

    /// Returns the question section.
    #[inline]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the first question if present.
    #[inline]
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns mutable access to the questions (e.g. for masking the
    /// unicast-response bit).
    #[inline]
    pub fn questions_mut(&mut self) -> &mut [Question] {
        &mut self.questions
    }

    /// Returns the answer section.
    #[inline]
    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    /// Returns the authority section.
    #[inline]
    pub fn authorities(&self) -> &[ResourceRecord] {
        &self.authorities
    }

    /// Returns the additional section.
    #[inline]
    pub fn additionals(&self) -> &[ResourceRecord] {
        &self.additionals
    }

    /// Adds a question.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
        self.header.qd_count = self.questions.len() as u16;
    }

    /// Adds an answer record.
    pub fn add_answer(&mut self, record: ResourceRecord) {
        self.answers.push(record);
        self.header.an_count = self.answers.len() as u16;
    }

    /// Adds multiple answer records.
    pub fn add_answers(&mut self, records: impl IntoIterator<Item = ResourceRecord>) {
        self.answers.extend(records);
        self.header.an_count = self.answers.len() as u16;
    }

    /// Adds an authority record.
    pub fn add_authority(&mut self, record: ResourceRecord) {
        self.authorities.push(record);
        self.header.ns_count = self.authorities.len() as u16;
    }

    /// Adds an additional record.
    pub fn add_additional(&mut self, record: ResourceRecord) {
        self.additionals.push(record);
        self.header.ar_count = self.additionals.len() as u16;
    }

    // =========================================================================
    // Response helpers
    // =========================================================================

    /// Returns true if this response is NOERROR with at least one answer.
    pub fn is_success(&self) -> bool {
        self.rcode().is_success() && !self.answers.is_empty()
    }

    /// Returns true if this is an NXDOMAIN response.
    pub fn is_nxdomain(&self) -> bool {
        self.rcode().is_nxdomain()
    }

    /// Returns true if this response is NOERROR with no answers.
    pub fn is_nodata(&self) -> bool {
        self.rcode().is_success() && self.answers.is_empty()
    }

    /// Returns true if this response is a referral: no answers, and NS
    /// records in the authority section.
    pub fn is_referral(&self) -> bool {
        self.answers.is_empty()
            && !self.authorities.is_empty()
            && self
                .authorities
                .iter()
                .any(|r| r.record_type() == Some(RecordType::NS))
    }

    /// Returns answer records of a specific type.
    pub fn answers_of_type(&self, rtype: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .filter(move |r| r.record_type() == Some(rtype))
    }

    /// Returns the first CNAME target in the answers.
    pub fn cname_target(&self) -> Option<&Name> {
        self.answers.iter().find_map(|r| r.rdata().as_cname())
    }

    /// Returns A record addresses from the answers.
    pub fn a_records(&self) -> impl Iterator<Item = std::net::Ipv4Addr> + '_ {
        self.answers.iter().filter_map(|r| r.rdata().as_a())
    }

    /// Returns AAAA record addresses from the answers.
    pub fn aaaa_records(&self) -> impl Iterator<Item = std::net::Ipv6Addr> + '_ {
        self.answers.iter().filter_map(|r| r.rdata().as_aaaa())
    }

    // =========================================================================
    // Wire format
    // =========================================================================

    /// Parses a DNS message from wire format.
    ///
    /// Truncated messages (TC set) fail with [`Error::Truncated`]: this
    /// codec discards them rather than retrying over another transport.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_at(data, Instant::now())
    }

    /// Parses a DNS message, anchoring record expiry at `now`.
    pub fn parse_at(data: &[u8], now: Instant) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, data.len()));
        }

        let header = Header::parse(data)?;

        if header.is_truncated() {
            return Err(Error::Truncated);
        }

        let mut offset = HEADER_SIZE;
        let mut questions = Vec::with_capacity(header.qd_count as usize);
        let mut q_parser = QuestionParser::new(data, offset, header.qd_count);
        while let Some(q) = q_parser.next()? {
            questions.push(q);
        }
        offset = q_parser.offset();

        let mut parse_section = |offset: &mut usize, count: u16| -> Result<Vec<ResourceRecord>> {
            let mut records = Vec::with_capacity(count as usize);
            let mut parser = RecordParser::new(data, *offset, count, now);
            while let Some(r) = parser.next()? {
                records.push(r);
            }
            *offset = parser.offset();
            Ok(records)
        };

        let answers = parse_section(&mut offset, header.an_count)?;
        let authorities = parse_section(&mut offset, header.ns_count)?;
        let additionals = parse_section(&mut offset, header.ar_count)?;

        Ok(Self {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    /// Returns the wire format length of this message.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE
            + self.questions.iter().map(Question::wire_len).sum::<usize>()
            + self
                .answers
                .iter()
                .chain(&self.authorities)
                .chain(&self.additionals)
                .map(ResourceRecord::wire_len)
                .sum::<usize>()
    }

    /// Writes the message to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        let mut header = self.header.clone();
        header.qd_count = self.questions.len() as u16;
        header.an_count = self.answers.len() as u16;
        header.ns_count = self.authorities.len() as u16;
        header.ar_count = self.additionals.len() as u16;

        header.write_to(buf);

        for q in &self.questions {
            q.write_to(buf);
        }
        for r in &self.answers {
            r.write_to(buf);
        }
        for r in &self.authorities {
            r.write_to(buf);
        }
        for r in &self.additionals {
            r.write_to(buf);
        }
    }

    /// Converts the message to wire format bytes.
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.write_to(&mut buf);
        buf.freeze()
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new(Header::default())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; ->>HEADER<<- {}", self.header)?;

        writeln!(f, ";; QUESTION SECTION:")?;
        for q in &self.questions {
            writeln!(f, ";{q}")?;
        }

        if !self.answers.is_empty() {
            writeln!(f, ";; ANSWER SECTION:")?;
            for r in &self.answers {
                writeln!(f, "{r}")?;
            }
        }

        if !self.authorities.is_empty() {
            writeln!(f, ";; AUTHORITY SECTION:")?;
            for r in &self.authorities {
                writeln!(f, "{r}")?;
            }
        }

        if !self.additionals.is_empty() {
            writeln!(f, ";; ADDITIONAL SECTION:")?;
            for r in &self.additionals {
                writeln!(f, "{r}")?;
            }
        }

        Ok(())
    }
}
