//! The multicast client's event surface.

use std::net::SocketAddr;
use verdin_proto::{Message, Name, RecordType, ResourceRecord};

/// An event published by the multicast client.
///
/// Handlers are invoked in arrival order per listener; events from the
/// two listeners interleave.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A response arrived and its records were stored.
    Answer {
        /// Where the response came from.
        from: SocketAddr,
        /// The full parsed message.
        message: Message,
        /// Records the cache had not seen before.
        added: Vec<ResourceRecord>,
        /// Records that refreshed an existing cache entry.
        updated: Vec<ResourceRecord>,
    },

    /// A query arrived; the caller may choose to answer it.
    Query {
        /// Where the query came from.
        from: SocketAddr,
        /// The full parsed message.
        message: Message,
    },

    /// A socket or processing error on a receive path.
    Error {
        /// Description of the failure.
        message: String,
        /// The remote endpoint, when one is known.
        from: Option<SocketAddr>,
    },

    /// Cached records under `name` are approaching expiry.
    RefreshDue {
        /// The owner name.
        name: Name,
        /// Distinct record types due for refresh.
        types: Vec<RecordType>,
    },

    /// Every cached record under `name` expired.
    Expired {
        /// The owner name.
        name: Name,
    },
}
