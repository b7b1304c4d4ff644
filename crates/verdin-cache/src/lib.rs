//! # Verdin DNS Cache
//!
//! Passive, TTL-aware record cache shared by the unicast resolver and
//! the multicast client.
//!
//! ## Semantics
//!
//! - Keyed by lowercased owner name; one bucket per owner, updates
//!   serialize on the bucket
//! - Records carry their own absolute expiry; expired records are
//!   pruned lazily on access
//! - mDNS cache-flush coalescing: a flush record purges same-type
//!   records older than a two-second grace window before insertion
//! - A curator task sweeps every four seconds, evicting the expired and
//!   marking records below 1/8 of their lifetime as stale so the owner
//!   can be refreshed before it drops out
//!
//! The cache is populated purely by observation of responses; nothing
//! here initiates traffic. Refresh is driven through [`CacheEvent`]
//! descriptors consumed by whoever owns the sockets.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod curator;
mod event;

pub use curator::spawn_curator;
pub use event::CacheEvent;

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::trace;
use verdin_proto::{Name, RData, RecordType, ResourceRecord, Type};

/// Cache tuning knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Grace window for cache-flush coalescing: flush purges same-type
    /// records older than this (RFC 6762 Section 10.2).
    pub flush_grace: Duration,

    /// Curator sweep cadence.
    pub curator_interval: Duration,

    /// Remaining-lifetime fraction below which the curator marks a
    /// record stale and signals refresh-due.
    pub stale_fraction: f64,

    /// Remaining-lifetime fraction a record must exceed to be attached
    /// to an outgoing query as a known answer.
    pub known_answer_fraction: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flush_grace: Duration::from_secs(2),
            curator_interval: Duration::from_secs(4),
            stale_fraction: 1.0 / 8.0,
            known_answer_fraction: 0.5,
        }
    }
}

/// Outcome of a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The record was filtered and not stored (OPT, NSEC, opaque).
    NoUpdate,
    /// An equal record existed and was replaced (TTL refresh).
    Update,
    /// The bucket did not contain this record before.
    NewData,
}

/// Passive record cache: lowercased owner name to set of records.
pub struct RecordCache {
    /// Sharded bucket map; each bucket is a critical section.
    buckets: DashMap<Name, Vec<ResourceRecord>>,
    /// Tuning knobs.
    config: CacheConfig,
}

impl RecordCache {
    /// Creates an empty cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates an empty cache with the given configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Stores a record, honoring the cache-flush bit.
    pub fn store(&self, record: ResourceRecord) -> StoreOutcome {
        self.store_at(record, Instant::now())
    }

    /// Stores a record against an explicit clock reading.
    pub fn store_at(&self, record: ResourceRecord, now: Instant) -> StoreOutcome {
        if !Self::is_storable(&record) {
            return StoreOutcome::NoUpdate;
        }

        let key = record.name().lowercased();
        let mut bucket = self.buckets.entry(key).or_default();

        // Cache-flush coalescing: purge same-type records that are older
        // than the grace window, keeping a simultaneous burst intact.
        if record.cache_flush() {
            let rtype = record.rtype();
            let grace = self.config.flush_grace;
            let before = bucket.len();
            bucket.retain(|r| {
                r.rtype() != rtype || now.saturating_duration_since(r.created_at()) <= grace
            });
            if bucket.len() != before {
                trace!(
                    owner = %record.name(),
                    purged = before - bucket.len(),
                    "cache-flush purge"
                );
            }
        }

        if let Some(existing) = bucket.iter_mut().find(|r| **r == record) {
            *existing = record;
            StoreOutcome::Update
        } else {
            bucket.push(record);
            StoreOutcome::NewData
        }
    }

    /// OPT, NSEC, and opaque records never enter the cache.
    fn is_storable(record: &ResourceRecord) -> bool {
        if matches!(record.rdata(), RData::Unknown(_)) {
            return false;
        }
        !matches!(
            record.rtype(),
            Type::Known(RecordType::OPT) | Type::Known(RecordType::NSEC) | Type::Unknown(_)
        )
    }

    /// Returns every fresh record under `name` whose type matches
    /// `qtype` (ANY matches all). Expired records are pruned on the way.
    pub fn search(&self, name: &Name, qtype: Type) -> Vec<ResourceRecord> {
        self.search_at(name, qtype, Instant::now())
    }

    /// [`RecordCache::search`] against an explicit clock reading.
    pub fn search_at(&self, name: &Name, qtype: Type, now: Instant) -> Vec<ResourceRecord> {
        let key = name.lowercased();
        let Some(mut bucket) = self.buckets.get_mut(&key) else {
            return Vec::new();
        };

        bucket.retain(|r| !r.is_expired(now));

        let any = matches!(qtype, Type::Known(RecordType::ANY));
        bucket
            .iter()
            .filter(|r| any || r.rtype().to_u16() == qtype.to_u16())
            .cloned()
            .collect()
    }

    /// Returns records under `name` of the given types whose remaining
    /// lifetime fraction exceeds the known-answer threshold. These are
    /// attached to outgoing mDNS queries so responders may suppress.
    pub fn known_answers(&self, name: &Name, types: &[RecordType]) -> Vec<ResourceRecord> {
        self.known_answers_at(name, types, Instant::now())
    }

    /// [`RecordCache::known_answers`] against an explicit clock reading.
    pub fn known_answers_at(
        &self,
        name: &Name,
        types: &[RecordType],
        now: Instant,
    ) -> Vec<ResourceRecord> {
        let key = name.lowercased();
        let Some(bucket) = self.buckets.get(&key) else {
            return Vec::new();
        };

        bucket
            .iter()
            .filter(|r| {
                r.record_type().is_some_and(|t| types.contains(&t))
                    && r.lifetime_fraction(now) > self.config.known_answer_fraction
            })
            .map(|r| r.with_remaining_ttl(now))
            .collect()
    }

    /// Runs one curator pass: evicts expired records, marks records
    /// below the stale threshold, and reports what each owner needs.
    ///
    /// Returns the event descriptors for the sweep; the caller decides
    /// how to deliver them.
    pub fn curate(&self, now: Instant) -> Vec<CacheEvent> {
        let mut events = Vec::new();

        for mut bucket in self.buckets.iter_mut() {
            let before = bucket.len();
            bucket.retain(|r| !r.is_expired(now));
            let expired = bucket.len() != before;

            let mut refresh_types: Vec<RecordType> = Vec::new();
            for record in bucket.iter_mut() {
                if !record.is_stale()
                    && record.lifetime_fraction(now) < self.config.stale_fraction
                {
                    record.set_stale(true);
                    if let Some(t) = record.record_type() {
                        if !refresh_types.contains(&t) {
                            refresh_types.push(t);
                        }
                    }
                }
            }

            if !refresh_types.is_empty() {
                events.push(CacheEvent::RefreshDue {
                    name: bucket.key().clone(),
                    types: refresh_types,
                });
            } else if expired {
                events.push(CacheEvent::Expired {
                    name: bucket.key().clone(),
                });
            }
        }

        // Drop buckets the sweep emptied
        self.buckets.retain(|_, records| !records.is_empty());

        events
    }

    /// Removes every record under `name`.
    pub fn remove(&self, name: &Name) {
        self.buckets.remove(&name.lowercased());
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.buckets.clear();
    }

    /// Returns the number of owner buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn a_record(name: &str, ttl: u32, last_octet: u8, now: Instant) -> ResourceRecord {
        ResourceRecord::new_at(
            Name::from_str(name).unwrap(),
            ttl,
            RData::A(verdin_proto::rdata::A::new(Ipv4Addr::new(
                192, 0, 2, last_octet,
            ))),
            now,
        )
    }

    #[test]
    fn test_store_and_search() {
        let cache = RecordCache::new();
        let now = Instant::now();

        let outcome = cache.store_at(a_record("host.local", 120, 1, now), now);
        assert_eq!(outcome, StoreOutcome::NewData);

        let found = cache.search_at(
            &Name::from_str("host.local").unwrap(),
            Type::Known(RecordType::A),
            now,
        );
        assert_eq!(found.len(), 1);

        // Lookup is case-insensitive
        let found = cache.search_at(
            &Name::from_str("HOST.LOCAL").unwrap(),
            Type::Known(RecordType::A),
            now,
        );
        assert_eq!(found.len(), 1);

        // Type filter applies
        let found = cache.search_at(
            &Name::from_str("host.local").unwrap(),
            Type::Known(RecordType::AAAA),
            now,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_restore_reports_update() {
        let cache = RecordCache::new();
        let now = Instant::now();

        assert_eq!(
            cache.store_at(a_record("host.local", 120, 1, now), now),
            StoreOutcome::NewData
        );
        // Same payload, fresh TTL: replaced in place
        assert_eq!(
            cache.store_at(a_record("host.local", 500, 1, now), now),
            StoreOutcome::Update
        );

        let found = cache.search_at(
            &Name::from_str("host.local").unwrap(),
            Type::Known(RecordType::A),
            now,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ttl(), 500);

        // Different payload is new data alongside the first
        assert_eq!(
            cache.store_at(a_record("host.local", 120, 2, now), now),
            StoreOutcome::NewData
        );
    }

    #[test]
    fn test_opaque_and_nsec_filtered() {
        let cache = RecordCache::new();
        let now = Instant::now();

        let opaque = ResourceRecord::new_at(
            Name::from_str("weird.local").unwrap(),
            60,
            RData::Unknown(verdin_proto::rdata::Unknown::new(4242, vec![1, 2, 3])),
            now,
        );
        assert_eq!(cache.store_at(opaque, now), StoreOutcome::NoUpdate);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expiry_pruned_on_search() {
        let cache = RecordCache::new();
        let now = Instant::now();

        cache.store_at(a_record("host.local", 10, 1, now), now);

        let later = now + Duration::from_secs(11);
        let found = cache.search_at(
            &Name::from_str("host.local").unwrap(),
            Type::Known(RecordType::A),
            later,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_fresh_until_expiry_instant() {
        let cache = RecordCache::new();
        let now = Instant::now();

        cache.store_at(a_record("host.local", 10, 1, now), now);

        // One nanosecond before expiry the record is still served
        let just_before = now + Duration::from_secs(10) - Duration::from_nanos(1);
        assert_eq!(
            cache
                .search_at(
                    &Name::from_str("host.local").unwrap(),
                    Type::Known(RecordType::A),
                    just_before,
                )
                .len(),
            1
        );
    }

    #[test]
    fn test_cache_flush_coalesce() {
        let cache = RecordCache::new();
        let t0 = Instant::now();
        let name = Name::from_str("host.local").unwrap();

        // R1 at t=0 with cache-flush
        cache.store_at(a_record("host.local", 120, 1, t0).with_cache_flush(true), t0);

        // R2 at t=1s with cache-flush: R1 is inside the 2 s grace window,
        // both remain
        let t1 = t0 + Duration::from_secs(1);
        cache.store_at(
            a_record("host.local", 120, 2, t0).with_cache_flush(true),
            t1,
        );
        assert_eq!(
            cache.search_at(&name, Type::Known(RecordType::A), t1).len(),
            2
        );

        // R3 at t=5s with cache-flush: R1 and R2 are now old, purged
        let t5 = t0 + Duration::from_secs(5);
        cache.store_at(
            a_record("host.local", 120, 3, t0).with_cache_flush(true),
            t5,
        );
        let found = cache.search_at(&name, Type::Known(RecordType::A), t5);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].rdata().as_a(),
            Some(Ipv4Addr::new(192, 0, 2, 3))
        );
    }

    #[test]
    fn test_cache_flush_leaves_other_types() {
        let cache = RecordCache::new();
        let t0 = Instant::now();
        let name = Name::from_str("host.local").unwrap();

        cache.store_at(a_record("host.local", 120, 1, t0), t0);
        cache.store_at(
            ResourceRecord::new_at(
                name.clone(),
                120,
                RData::TXT(verdin_proto::rdata::TXT::single("v=1")),
                t0,
            ),
            t0,
        );

        // A flush A record five seconds later purges only A records
        let t5 = t0 + Duration::from_secs(5);
        cache.store_at(
            a_record("host.local", 120, 9, t0).with_cache_flush(true),
            t5,
        );

        assert_eq!(
            cache.search_at(&name, Type::Known(RecordType::TXT), t5).len(),
            1
        );
        assert_eq!(
            cache.search_at(&name, Type::Known(RecordType::A), t5).len(),
            1
        );
    }

    #[test]
    fn test_known_answers_threshold() {
        let cache = RecordCache::new();
        let now = Instant::now();
        let name = Name::from_str("_http._tcp.local").unwrap();

        let fresh = ResourceRecord::new_at(
            name.clone(),
            100,
            RData::PTR(verdin_proto::rdata::PTR::new(
                Name::from_str("web._http._tcp.local").unwrap(),
            )),
            now,
        );
        cache.store_at(fresh, now);

        // Just stored: full lifetime ahead, qualifies
        let known = cache.known_answers_at(&name, &[RecordType::PTR], now);
        assert_eq!(known.len(), 1);

        // 60 of 100 seconds gone: 40% left, no longer qualifies
        let later = now + Duration::from_secs(60);
        let known = cache.known_answers_at(&name, &[RecordType::PTR], later);
        assert!(known.is_empty());
    }

    #[test]
    fn test_known_answers_carry_remaining_ttl() {
        let cache = RecordCache::new();
        let now = Instant::now();
        let name = Name::from_str("_http._tcp.local").unwrap();

        cache.store_at(
            ResourceRecord::ptr(
                name.clone(),
                100,
                Name::from_str("web._http._tcp.local").unwrap(),
            ),
            now,
        );

        let later = now + Duration::from_secs(20);
        let known = cache.known_answers_at(&name, &[RecordType::PTR], later);
        assert_eq!(known.len(), 1);
        assert!(known[0].ttl() <= 80);
    }

    #[test]
    fn test_curate_marks_stale_and_reports() {
        let cache = RecordCache::new();
        let t0 = Instant::now();

        // 100 s TTL, 90 s elapsed: 10% left, below the 1/8 threshold
        cache.store_at(a_record("printer.local", 100, 1, t0), t0);

        let sweep = t0 + Duration::from_secs(90);
        let events = cache.curate(sweep);

        assert_eq!(events.len(), 1);
        match &events[0] {
            CacheEvent::RefreshDue { name, types } => {
                assert_eq!(name, &Name::from_str("printer.local").unwrap());
                assert_eq!(types, &[RecordType::A]);
            }
            other => panic!("expected refresh-due, got {other:?}"),
        }

        // Already marked: a second sweep stays quiet
        let events = cache.curate(sweep + Duration::from_secs(1));
        assert!(events.is_empty());
    }

    #[test]
    fn test_curate_reports_expired_bucket() {
        let cache = RecordCache::new();
        let t0 = Instant::now();

        cache.store_at(a_record("gone.local", 10, 1, t0), t0);

        let sweep = t0 + Duration::from_secs(30);
        let events = cache.curate(sweep);

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            CacheEvent::Expired { name } if name == &Name::from_str("gone.local").unwrap()
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_curate_distinct_types() {
        let cache = RecordCache::new();
        let t0 = Instant::now();
        let name = Name::from_str("web._http._tcp.local").unwrap();

        cache.store_at(
            ResourceRecord::new_at(
                name.clone(),
                100,
                RData::SRV(verdin_proto::rdata::SRV::new(
                    0,
                    0,
                    80,
                    Name::from_str("host.local").unwrap(),
                )),
                t0,
            ),
            t0,
        );
        cache.store_at(
            ResourceRecord::new_at(
                name.clone(),
                100,
                RData::TXT(verdin_proto::rdata::TXT::single("path=/")),
                t0,
            ),
            t0,
        );

        let events = cache.curate(t0 + Duration::from_secs(95));
        assert_eq!(events.len(), 1);
        match &events[0] {
            CacheEvent::RefreshDue { types, .. } => {
                assert!(types.contains(&RecordType::SRV));
                assert!(types.contains(&RecordType::TXT));
                assert_eq!(types.len(), 2);
            }
            other => panic!("expected refresh-due, got {other:?}"),
        }
    }
}
