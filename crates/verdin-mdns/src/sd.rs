//! DNS-SD naming and query construction (RFC 6763).
//!
//! Service discovery names follow
//! `<instance>.<_service>.<_proto>.<domain>` with `_proto` one of
//! `_tcp` or `_udp`. Instance labels are user-facing strings and may
//! contain spaces and punctuation.

use crate::{MdnsError, Result};
use std::str::FromStr;
use verdin_cache::RecordCache;
use verdin_proto::{Message, Name, Question, RecordClass, RecordType};

/// The meta-query name enumerating service types in a domain
/// (RFC 6763 Section 9).
pub const SERVICE_ENUMERATION: &str = "_services._dns-sd._udp";

/// A parsed DNS-SD service instance name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    /// The instance label, e.g. `Living Room Printer`.
    pub instance: String,
    /// The service with protocol, e.g. `_ipp._tcp`.
    pub service: String,
    /// The parent domain, e.g. `local`.
    pub domain: Name,
}

impl ServiceInstance {
    /// Creates an instance name from its parts.
    pub fn new(
        instance: impl Into<String>,
        service: impl Into<String>,
        domain: &str,
    ) -> Result<Self> {
        let domain = Name::from_str(domain)
            .map_err(|e| MdnsError::InvalidInput(format!("bad domain: {e}")))?;
        Ok(Self {
            instance: instance.into(),
            service: service.into(),
            domain,
        })
    }

    /// Renders the fully qualified owner name.
    pub fn to_name(&self) -> Result<Name> {
        let service = service_name(&self.service, &self.domain)?;
        Ok(service.prepend_label(self.instance.as_bytes())?)
    }

    /// Splits a fully qualified instance name back into its parts.
    ///
    /// Returns `None` unless the name has the
    /// `<instance>.<_service>.<_proto>.<domain>` shape.
    pub fn from_name(name: &Name) -> Option<Self> {
        let labels: Vec<_> = name.labels().filter(|l| !l.is_root()).collect();
        if labels.len() < 4 {
            return None;
        }

        let service = labels[1].as_bytes();
        let proto = labels[2].as_bytes();
        if service.first() != Some(&b'_') {
            return None;
        }
        if !proto.eq_ignore_ascii_case(b"_tcp") && !proto.eq_ignore_ascii_case(b"_udp") {
            return None;
        }

        let instance = labels[0].as_str_lossy().into_owned();
        let service = format!("{}.{}", labels[1].as_str_lossy(), labels[2].as_str_lossy());
        let domain = name.parent()?.parent()?.parent()?;

        Some(Self {
            instance,
            service,
            domain,
        })
    }
}

impl std::fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.instance, self.service, self.domain)
    }
}

/// Builds the owner name for a service in a domain
/// (`_http._tcp` + `local` = `_http._tcp.local`).
pub fn service_name(service: &str, domain: &Name) -> Result<Name> {
    let service = Name::from_str(service)
        .map_err(|e| MdnsError::InvalidInput(format!("bad service: {e}")))?;
    Ok(service.join(domain)?)
}

/// Builds an outgoing multicast query for `name`.
///
/// One question per type, each optionally requesting a unicast
/// response (masked off when the platform cannot honor it), plus
/// known answers from the cache: records of the queried types with
/// more than half their lifetime left ride along in the answer section
/// so responders may suppress them (RFC 6762 Section 7.1).
pub fn build_query(
    cache: &RecordCache,
    name: &Name,
    types: &[RecordType],
    unicast_response: bool,
    unicast_supported: bool,
) -> Message {
    let mut questions = types.iter().map(|&rtype| {
        Question::new(name.clone(), rtype, RecordClass::IN)
            .with_unicast_response(unicast_response && unicast_supported)
    });

    let first = questions
        .next()
        .expect("at least one query type is required");
    let mut message = Message::multicast_query(first);
    for question in questions {
        message.add_question(question);
    }

    for known in cache.known_answers(name, types) {
        message.add_answer(known);
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use verdin_proto::ResourceRecord;

    #[test]
    fn test_instance_roundtrip() {
        let instance = ServiceInstance::new("Living Room Printer", "_ipp._tcp", "local").unwrap();
        let name = instance.to_name().unwrap();

        assert_eq!(name.label_count(), 5); // instance, _ipp, _tcp, local, root
        assert_eq!(name.label(0).unwrap().as_bytes(), b"Living Room Printer");

        let parsed = ServiceInstance::from_name(&name).unwrap();
        assert_eq!(parsed, instance);
    }

    #[test]
    fn test_from_name_rejects_non_sd_shapes() {
        assert!(ServiceInstance::from_name(&"host.local".parse().unwrap()).is_none());
        assert!(ServiceInstance::from_name(&"a.b.c.d".parse().unwrap()).is_none());
        assert!(
            ServiceInstance::from_name(&"x._http._sctp.local".parse().unwrap()).is_none()
        );
    }

    #[test]
    fn test_service_name() {
        let domain = Name::from_str("local").unwrap();
        let name = service_name("_http._tcp", &domain).unwrap();
        assert_eq!(name.to_string(), "_http._tcp.local.");
    }

    #[test]
    fn test_build_query_attaches_known_answers() {
        let cache = RecordCache::new();
        let name = Name::from_str("_http._tcp.local").unwrap();

        // A PTR with its whole lifetime ahead qualifies as known
        cache.store(ResourceRecord::ptr(
            name.clone(),
            120,
            Name::from_str("web._http._tcp.local").unwrap(),
        ));

        let message = build_query(&cache, &name, &[RecordType::PTR], false, false);

        assert_eq!(message.id(), 0);
        assert_eq!(message.questions().len(), 1);
        assert_eq!(message.answers().len(), 1);
        assert_eq!(
            message.answers()[0].rdata().as_ptr().unwrap().to_string(),
            "web._http._tcp.local."
        );
    }

    #[test]
    fn test_build_query_skips_tired_known_answers() {
        let cache = RecordCache::new();
        let name = Name::from_str("_http._tcp.local").unwrap();

        // Backdated past half its lifetime: not attached
        let past = Instant::now() - std::time::Duration::from_secs(80);
        cache.store(ResourceRecord::new_at(
            name.clone(),
            120,
            verdin_proto::RData::PTR(verdin_proto::rdata::PTR::new(
                Name::from_str("web._http._tcp.local").unwrap(),
            )),
            past,
        ));

        let message = build_query(&cache, &name, &[RecordType::PTR], false, false);
        assert!(message.answers().is_empty());
    }

    #[test]
    fn test_unicast_bit_masked_when_unsupported() {
        let cache = RecordCache::new();
        let name = Name::from_str("_http._tcp.local").unwrap();

        let message = build_query(&cache, &name, &[RecordType::PTR], true, false);
        assert!(!message.questions()[0].unicast_response);

        let message = build_query(&cache, &name, &[RecordType::PTR], true, true);
        assert!(message.questions()[0].unicast_response);
    }

    #[test]
    fn test_multi_type_query() {
        let cache = RecordCache::new();
        let name = Name::from_str("web._http._tcp.local").unwrap();

        let message = build_query(
            &cache,
            &name,
            &[RecordType::SRV, RecordType::TXT],
            false,
            false,
        );
        assert_eq!(message.questions().len(), 2);
    }
}
