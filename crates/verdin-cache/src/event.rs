//! Cache event descriptors.

use verdin_proto::{Name, RecordType};

/// An event emitted by the cache curator.
///
/// The cache never issues queries itself; it describes what an owner
/// needs and lets the consumer (typically the multicast client) decide
/// whether to go on the wire. This keeps the cache/client wiring
/// acyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Records under `name` are approaching expiry and were marked
    /// stale; `types` lists the distinct record types observed.
    RefreshDue {
        /// The owner name.
        name: Name,
        /// Distinct record types due for refresh.
        types: Vec<RecordType>,
    },

    /// Every record under `name` expired during the sweep.
    Expired {
        /// The owner name.
        name: Name,
    },
}

impl CacheEvent {
    /// Returns the owner name the event concerns.
    pub fn name(&self) -> &Name {
        match self {
            Self::RefreshDue { name, .. } | Self::Expired { name } => name,
        }
    }
}
