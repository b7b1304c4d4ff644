//! # Verdin
//!
//! Compact client library for DNS and multicast DNS (mDNS/DNS-SD):
//! a wire-format codec with defensive parsing limits, an iterative
//! unicast resolver with optional DNS-over-HTTPS, a multicast client
//! with known-answer suppression, and the TTL-aware passive cache that
//! ties them together.
//!
//! ## Crates
//!
//! - [`proto`]: names, records, questions, messages
//! - [`cache`]: the passive record cache and its curator
//! - [`resolver`]: the unicast resolver, presets, system discovery
//! - [`mdns`]: the multicast client and DNS-SD helpers
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use verdin::resolver::{ResolutionMode, Resolver};
//!
//! let resolver = Resolver::new(ResolutionMode::SecureWithFallback);
//! let addrs = resolver.resolve_host("example.com").await?;
//! ```

#![warn(missing_docs)]

pub use verdin_cache as cache;
pub use verdin_mdns as mdns;
pub use verdin_proto as proto;
pub use verdin_resolver as resolver;

pub use verdin_proto::{
    Message, Name, OpCode, Question, RData, RecordClass, RecordType, ResourceRecord, ResponseCode,
};
