//! # Verdin Multicast DNS Client
//!
//! Multicast DNS (RFC 6762) and DNS-SD (RFC 6763) client: joins the
//! link-local groups, observes responses into the shared passive cache,
//! answers service-discovery questions out of it, and keeps live
//! service records fresh by re-querying when the cache signals expiry.
//!
//! ## Features
//!
//! - IPv4 and IPv6 listeners on port 5353 with address reuse, group
//!   joins per configured interface
//! - Known-answer suppression on outgoing queries
//! - Duplicate-message suppression over a short sliding window
//! - DNS-SD helpers: service enumeration, instance queries, instance
//!   resolution, host and reverse lookups
//! - Typed event surface (answers, queries, errors, refreshes)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod dedup;
mod event;
mod pool;
pub mod sd;

pub use client::{MDNS_GROUP_V4, MDNS_GROUP_V6, MdnsConfig, MulticastClient, ResolvedInstance};
pub use dedup::DuplicateFilter;
pub use event::ClientEvent;
pub use pool::{BufferPool, PooledBuffer};
pub use sd::{ServiceInstance, build_query};

use thiserror::Error;

/// Multicast client errors.
///
/// Wire-level problems never surface here: parse failures are dropped,
/// socket errors are routed to the error event. Callers see only
/// lifecycle and argument mistakes.
#[derive(Error, Debug)]
pub enum MdnsError {
    /// `start` was called twice.
    #[error("multicast client already started")]
    AlreadyStarted,

    /// An operation that needs sockets ran before `start`.
    #[error("multicast client not started")]
    NotStarted,

    /// Socket setup failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// Null, empty, or unusable argument.
    #[error("invalid argument: {0}")]
    InvalidInput(String),

    /// A name failed to parse or compose.
    #[error("name error: {0}")]
    Name(#[from] verdin_proto::Error),
}

/// Result type for multicast client operations.
pub type Result<T> = std::result::Result<T, MdnsError>;
