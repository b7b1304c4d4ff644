//! # Verdin DNS Resolver
//!
//! Unicast resolver implementing iterative resolution with cached
//! delegations, CNAME chasing, optional DNS-over-HTTPS transport
//! (RFC 8484), and a guard against leaking private-namespace queries to
//! public nameservers.
//!
//! ## Features
//!
//! - Iterative resolution starting from any nameserver set, following
//!   referrals with glue records
//! - Resolution modes: UDP only, DoH only, or DoH with UDP fallback
//! - Private-leak guard: `.local` and single-label questions are only
//!   ever sent to nameservers in private address ranges
//! - System nameserver discovery with change watching
//! - Preset server sets (Cloudflare, Google, root servers) and a
//!   hints-file parser

#![warn(missing_docs)]
#![warn(clippy::all)]

mod doh;
pub mod hints;
mod private;
mod resolver;
pub mod system;

pub use private::{is_private_address, is_private_question};
pub use resolver::Resolver;

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;
use verdin_proto::{Message, Name, Question};

/// Resolver error.
///
/// Network, parse, and transport failures are absorbed inside the
/// resolution loop (the next nameserver is tried); only invalid
/// arguments and depth-guard exhaustion reach callers.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Null, empty, or otherwise unusable argument at a public entry point.
    #[error("invalid argument: {0}")]
    InvalidInput(String),

    /// The iterative resolution depth guard (10) was exhausted.
    #[error("maximum resolution depth exceeded")]
    DepthExceeded,

    /// Per-attempt wall clock (3 s) exceeded.
    #[error("timeout")]
    Timeout,

    /// DoH or socket transport failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Socket-level I/O error.
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// The response did not parse.
    #[error("malformed response: {0}")]
    Malformed(#[from] verdin_proto::Error),
}

impl ResolverError {
    /// Returns true if the DoH-with-fallback mode should retry this
    /// attempt over plain UDP.
    pub(crate) fn is_fallback_worthy(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Transport(_) | Self::Network(_)
        )
    }
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// How queries reach a nameserver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// Plain UDP only.
    #[default]
    InsecureOnly,
    /// DNS-over-HTTPS only; fail when it is unavailable.
    SecureOnly,
    /// DNS-over-HTTPS first, falling back to UDP on HTTPS or timeout
    /// errors, unless the nameserver is known not to support DoH.
    SecureWithFallback,
}

/// A nameserver the resolver may contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameserverConfig {
    /// The nameserver address.
    pub address: IpAddr,

    /// Whether the server speaks DNS-over-HTTPS: `Some(true)` yes,
    /// `Some(false)` no, `None` unknown.
    pub doh: Option<bool>,

    /// DNS search suffix associated with this server, used to complete
    /// single-label names.
    pub search_suffix: Option<Name>,
}

impl NameserverConfig {
    /// Creates a nameserver entry with unknown DoH support.
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            doh: None,
            search_suffix: None,
        }
    }

    /// Sets the DoH support flag.
    #[must_use]
    pub fn with_doh(mut self, doh: bool) -> Self {
        self.doh = Some(doh);
        self
    }

    /// Sets the search suffix.
    #[must_use]
    pub fn with_search_suffix(mut self, suffix: Name) -> Self {
        self.search_suffix = Some(suffix);
        self
    }
}

impl From<IpAddr> for NameserverConfig {
    fn from(address: IpAddr) -> Self {
        Self::new(address)
    }
}

/// The query primitive implemented by resolvers.
///
/// The trait seam exists so callers can substitute fakes in tests.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves a single question, returning the first usable response
    /// or `None` when every nameserver was exhausted.
    async fn resolve_query(&self, question: Question) -> Result<Option<Message>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_nameserver_config() {
        let ns = NameserverConfig::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))).with_doh(true);
        assert_eq!(ns.doh, Some(true));
        assert!(ns.search_suffix.is_none());
    }

    #[test]
    fn test_default_mode() {
        assert_eq!(ResolutionMode::default(), ResolutionMode::InsecureOnly);
    }

    #[test]
    fn test_fallback_classification() {
        assert!(ResolverError::Timeout.is_fallback_worthy());
        assert!(ResolverError::Transport("503".into()).is_fallback_worthy());
        assert!(!ResolverError::DepthExceeded.is_fallback_worthy());
        assert!(!ResolverError::InvalidInput("x".into()).is_fallback_worthy());
    }
}
