//! Duplicate-message suppression.
//!
//! mDNS responders repeat answers across interfaces and for robustness;
//! a short sliding window of (message fingerprint, sender) pairs keeps
//! the receive path from processing the same datagram twice. The
//! transaction id is zero on the multicast wire, so the fingerprint
//! covers the content that actually varies: questions, answers, and
//! additionals.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use verdin_proto::Message;

/// Default window capacity.
const DEFAULT_CAPACITY: usize = 100;

/// Default entry lifetime.
const DEFAULT_TTL: Duration = Duration::from_secs(5);

struct Entry {
    fingerprint: u64,
    sender: SocketAddr,
    received_at: Instant,
}

/// Bounded FIFO of recently seen (message, sender) pairs.
pub struct DuplicateFilter {
    entries: Mutex<VecDeque<Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl DuplicateFilter {
    /// Creates a filter with the standard window (100 entries, 5 s).
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Creates a filter with explicit limits.
    pub fn with_limits(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ttl,
        }
    }

    /// Returns true if `(message, sender)` was already seen inside the
    /// window; otherwise records it.
    pub fn is_duplicate(&self, message: &Message, sender: SocketAddr) -> bool {
        self.is_duplicate_at(message, sender, Instant::now())
    }

    /// [`DuplicateFilter::is_duplicate`] against an explicit clock.
    pub fn is_duplicate_at(&self, message: &Message, sender: SocketAddr, now: Instant) -> bool {
        let fingerprint = fingerprint(message);
        let mut entries = self.entries.lock();

        // Age eviction
        while let Some(front) = entries.front() {
            if now.saturating_duration_since(front.received_at) > self.ttl {
                entries.pop_front();
            } else {
                break;
            }
        }

        if entries
            .iter()
            .any(|e| e.fingerprint == fingerprint && e.sender == sender)
        {
            return true;
        }

        // Size eviction
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Entry {
            fingerprint,
            sender,
            received_at: now,
        });

        false
    }

    /// Returns the number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Content hash over the sections that distinguish mDNS messages.
fn fingerprint(message: &Message) -> u64 {
    let mut hasher = DefaultHasher::new();
    for q in message.questions() {
        q.hash(&mut hasher);
    }
    for r in message.answers() {
        r.hash(&mut hasher);
    }
    for r in message.additionals() {
        r.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::str::FromStr;
    use verdin_proto::{Name, Question, ResourceRecord};

    fn sender(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)), port)
    }

    fn sample_message(owner: &str) -> Message {
        let mut msg = Message::multicast_query(Question::ptr(Name::from_str(owner).unwrap()));
        msg.add_answer(ResourceRecord::ptr(
            Name::from_str(owner).unwrap(),
            120,
            Name::from_str("web._http._tcp.local").unwrap(),
        ));
        msg
    }

    #[test]
    fn test_duplicate_detected() {
        let filter = DuplicateFilter::new();
        let msg = sample_message("_http._tcp.local");

        assert!(!filter.is_duplicate(&msg, sender(5353)));
        assert!(filter.is_duplicate(&msg, sender(5353)));
    }

    #[test]
    fn test_different_sender_not_duplicate() {
        let filter = DuplicateFilter::new();
        let msg = sample_message("_http._tcp.local");

        assert!(!filter.is_duplicate(&msg, sender(5353)));
        assert!(!filter.is_duplicate(
            &msg,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 11)), 5353)
        ));
    }

    #[test]
    fn test_different_content_not_duplicate() {
        let filter = DuplicateFilter::new();

        assert!(!filter.is_duplicate(&sample_message("_http._tcp.local"), sender(5353)));
        assert!(!filter.is_duplicate(&sample_message("_ipp._tcp.local"), sender(5353)));
    }

    #[test]
    fn test_age_eviction() {
        let filter = DuplicateFilter::new();
        let msg = sample_message("_http._tcp.local");
        let t0 = Instant::now();

        assert!(!filter.is_duplicate_at(&msg, sender(5353), t0));
        // Six seconds later the entry has aged out
        assert!(!filter.is_duplicate_at(&msg, sender(5353), t0 + Duration::from_secs(6)));
    }

    #[test]
    fn test_size_eviction() {
        let filter = DuplicateFilter::with_limits(3, Duration::from_secs(60));
        let now = Instant::now();

        let first = sample_message("a._tcp.local");
        assert!(!filter.is_duplicate_at(&first, sender(5353), now));
        assert!(!filter.is_duplicate_at(&sample_message("b._tcp.local"), sender(5353), now));
        assert!(!filter.is_duplicate_at(&sample_message("c._tcp.local"), sender(5353), now));

        // A fourth entry pushes the first out
        assert!(!filter.is_duplicate_at(&sample_message("d._tcp.local"), sender(5353), now));
        assert_eq!(filter.len(), 3);
        assert!(!filter.is_duplicate_at(&first, sender(5353), now));
    }

    #[test]
    fn test_id_excluded_from_fingerprint() {
        let filter = DuplicateFilter::new();
        let mut msg = sample_message("_http._tcp.local");

        assert!(!filter.is_duplicate(&msg, sender(5353)));
        msg.set_id(0x4242);
        assert!(filter.is_duplicate(&msg, sender(5353)));
    }
}
