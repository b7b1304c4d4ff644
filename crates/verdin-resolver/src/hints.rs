//! Preset nameserver sets and the root-hints fragment parser.

use crate::NameserverConfig;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::warn;
use verdin_proto::rdata::{A, AAAA, CNAME, DNAME, NS, PTR, Unknown};
use verdin_proto::{Name, RData, ResourceRecord};

/// IANA root servers, A and AAAA, as of the 2024 hints file.
const ROOT_SERVERS: &[(&str, Option<&str>)] = &[
    ("198.41.0.4", Some("2001:503:ba3e::2:30")),
    ("199.9.14.201", Some("2001:500:200::b")),
    ("192.33.4.12", Some("2001:500:2::c")),
    ("199.7.91.13", Some("2001:500:2d::d")),
    ("192.203.230.10", Some("2001:500:a8::e")),
    ("192.5.5.241", Some("2001:500:2f::f")),
    ("192.112.36.4", Some("2001:500:12::d0d")),
    ("198.97.190.53", Some("2001:500:1::53")),
    ("192.36.148.17", Some("2001:7fe::53")),
    ("192.58.128.30", Some("2001:503:c27::2:30")),
    ("193.0.14.129", Some("2001:7fd::1")),
    ("199.7.83.42", Some("2001:500:9f::42")),
    ("202.12.27.33", Some("2001:dc3::35")),
];

/// Returns the IANA root servers. Root servers speak plain DNS only.
pub fn root_servers() -> Vec<NameserverConfig> {
    let mut servers = Vec::with_capacity(ROOT_SERVERS.len() * 2);
    for (v4, v6) in ROOT_SERVERS {
        if let Ok(addr) = v4.parse::<IpAddr>() {
            servers.push(NameserverConfig::new(addr).with_doh(false));
        }
        if let Some(v6) = v6 {
            if let Ok(addr) = v6.parse::<IpAddr>() {
                servers.push(NameserverConfig::new(addr).with_doh(false));
            }
        }
    }
    servers
}

/// Cloudflare public resolvers (1.1.1.1), DoH capable.
pub fn cloudflare() -> Vec<NameserverConfig> {
    vec![
        NameserverConfig::new(IpAddr::V4([1, 1, 1, 1].into())).with_doh(true),
        NameserverConfig::new(IpAddr::V4([1, 0, 0, 1].into())).with_doh(true),
    ]
}

/// Google public resolvers (8.8.8.8), DoH capable.
pub fn google() -> Vec<NameserverConfig> {
    vec![
        NameserverConfig::new(IpAddr::V4([8, 8, 8, 8].into())).with_doh(true),
        NameserverConfig::new(IpAddr::V4([8, 8, 4, 4].into())).with_doh(true),
    ]
}

/// Parses a zone-file fragment of hints into records.
///
/// Each non-comment, non-empty line is `owner ttl type rdata`,
/// whitespace-delimited with at most four columns; `;` starts a
/// comment. A, AAAA, PTR, CNAME, DNAME, and NS rdata are parsed; other
/// types are carried opaquely. Unusable lines are skipped.
pub fn parse_hints(text: &str) -> Vec<ResourceRecord> {
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut columns = line.split_whitespace();
        let (Some(owner), Some(ttl), Some(rtype)) =
            (columns.next(), columns.next(), columns.next())
        else {
            warn!(line, "hints line has fewer than four columns");
            continue;
        };
        let rdata = columns.collect::<Vec<_>>().join(" ");
        if rdata.is_empty() {
            warn!(line, "hints line has no rdata column");
            continue;
        }
        let rdata = rdata.as_str();

        let Ok(owner) = Name::from_str(owner) else {
            warn!(line, "unparseable hints owner");
            continue;
        };
        let Ok(ttl) = ttl.trim().parse::<u32>() else {
            warn!(line, "unparseable hints TTL");
            continue;
        };

        let rdata = match rtype.to_ascii_uppercase().as_str() {
            "A" => match rdata.parse() {
                Ok(addr) => RData::A(A::new(addr)),
                Err(_) => {
                    warn!(line, "unparseable A rdata");
                    continue;
                }
            },
            "AAAA" => match rdata.parse() {
                Ok(addr) => RData::AAAA(AAAA::new(addr)),
                Err(_) => {
                    warn!(line, "unparseable AAAA rdata");
                    continue;
                }
            },
            "PTR" => match Name::from_str(rdata) {
                Ok(name) => RData::PTR(PTR::new(name)),
                Err(_) => continue,
            },
            "CNAME" => match Name::from_str(rdata) {
                Ok(name) => RData::CNAME(CNAME::new(name)),
                Err(_) => continue,
            },
            "DNAME" => match Name::from_str(rdata) {
                Ok(name) => RData::DNAME(DNAME::new(name)),
                Err(_) => continue,
            },
            "NS" => match Name::from_str(rdata) {
                Ok(name) => RData::NS(NS::new(name)),
                Err(_) => continue,
            },
            other => {
                // Everything else rides along opaquely
                let code = type_code(other);
                RData::Unknown(Unknown::new(code, rdata.as_bytes().to_vec()))
            }
        };

        records.push(ResourceRecord::new(owner, ttl, rdata));
    }

    records
}

/// Best-effort numeric code for a type mnemonic ("TYPE123" or a known
/// name); zero when nothing fits.
fn type_code(mnemonic: &str) -> u16 {
    if let Some(rest) = mnemonic.strip_prefix("TYPE") {
        if let Ok(code) = rest.parse() {
            return code;
        }
    }
    match mnemonic {
        "SOA" => 6,
        "TXT" => 16,
        "SRV" => 33,
        "MX" => 15,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdin_proto::RecordType;

    #[test]
    fn test_presets() {
        let cf = cloudflare();
        assert_eq!(cf.len(), 2);
        assert_eq!(cf[0].address.to_string(), "1.1.1.1");
        assert_eq!(cf[0].doh, Some(true));

        let goog = google();
        assert_eq!(goog[0].address.to_string(), "8.8.8.8");
        assert_eq!(goog[1].address.to_string(), "8.8.4.4");
    }

    #[test]
    fn test_root_servers() {
        let roots = root_servers();
        // 13 letters, v4 + v6 each
        assert_eq!(roots.len(), 26);
        assert!(roots.iter().any(|s| s.address.to_string() == "198.41.0.4"));
        assert!(roots.iter().all(|s| s.doh == Some(false)));
    }

    #[test]
    fn test_parse_hints() {
        let text = "\
; root hints excerpt
.                        3600000      NS    a.root-servers.net.
a.root-servers.net.      3600000      A     198.41.0.4
a.root-servers.net.      3600000      AAAA  2001:503:ba3e::2:30

; trailing comment line
";
        let records = parse_hints(text);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].record_type(), Some(RecordType::NS));
        assert!(records[0].name().is_root());

        assert_eq!(records[1].record_type(), Some(RecordType::A));
        assert_eq!(
            records[1].rdata().as_a().unwrap().to_string(),
            "198.41.0.4"
        );

        assert_eq!(records[2].record_type(), Some(RecordType::AAAA));
    }

    #[test]
    fn test_parse_hints_opaque_and_garbage() {
        let text = "\
host.example. 300 TXT \"hello\"
broken line
host.example. abc A 1.2.3.4
";
        let records = parse_hints(text);
        // TXT becomes opaque; the other two lines are dropped
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0].rdata(), RData::Unknown(u) if u.type_code() == 16));
    }
}
