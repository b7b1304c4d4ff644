//! # Verdin DNS Protocol Library
//!
//! Wire-format codec for DNS and multicast DNS messages following
//! RFC 1035, RFC 3596, RFC 6762, and RFC 9460.
//!
//! ## Features
//!
//! - **Name compression handling** on parse with strict defensive limits
//!   (backward-only pointers, bounded chase depth)
//! - **Typed resource records** for the client-relevant types (A, AAAA,
//!   NS, CNAME, DNAME, PTR, TXT, SRV, SOA, SVCB, HTTPS) with an opaque
//!   fallback for everything else
//! - **mDNS extensions**: cache-flush bit on records, unicast-response
//!   bit on questions
//! - **Expiry-aware records**: TTLs are resolved to an absolute expiry
//!   instant at parse time
//!
//! ## Example
//!
//! ```rust,ignore
//! use verdin_proto::{Message, Name, Question, RecordType};
//!
//! // Parse a DNS message from wire format
//! let message = Message::parse(&bytes)?;
//!
//! // Build a query
//! let query = Message::query(Question::a("example.com".parse()?));
//! let wire = query.to_wire();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod class;
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod opcode;
pub mod question;
pub mod rcode;
pub mod rdata;
pub mod record;
pub mod rtype;

// Re-exports for convenience
pub use class::{Class, RecordClass};
pub use error::{Error, Result};
pub use header::Header;
pub use message::Message;
pub use name::Name;
pub use opcode::OpCode;
pub use question::Question;
pub use rcode::ResponseCode;
pub use rdata::RData;
pub use record::{RecordParser, ResourceRecord};
pub use rtype::{RecordType, Type};

/// Maximum length of a DNS label (63 bytes per RFC 1035).
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a domain name in wire format (255 bytes per RFC 1035).
pub const MAX_NAME_LENGTH: usize = 255;

/// Receive buffer size for plain UDP DNS (512 bytes per RFC 1035).
pub const UDP_RECV_BUFFER_SIZE: usize = 512;

/// Receive buffer size for mDNS over IPv4.
///
/// 9000-byte jumbo frame minus IPv4 (20) and UDP (8) headers, per
/// RFC 6762 Section 17.
pub const MDNS_IPV4_RECV_BUFFER_SIZE: usize = 8972;

/// Receive buffer size for mDNS over IPv6 (40-byte IPv6 header).
pub const MDNS_IPV6_RECV_BUFFER_SIZE: usize = 8952;

/// Send buffer size for outgoing mDNS datagrams.
pub const MDNS_SEND_BUFFER_SIZE: usize = 4096;

/// DNS port (53).
pub const DNS_PORT: u16 = 53;

/// Multicast DNS port (5353).
pub const MDNS_PORT: u16 = 5353;
