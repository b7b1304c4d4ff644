//! Workspace-level integration tests exercising the public surface.

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::{Duration, Instant};

use verdin::cache::RecordCache;
use verdin::mdns::{build_query, ServiceInstance};
use verdin::proto::name::NameParser;
use verdin::proto::{Header, Message, Name, Question, RecordType, ResourceRecord, ResponseCode};
use verdin::resolver::{NameserverConfig, ResolutionMode, Resolver};

#[test]
fn header_decode() {
    let wire = [
        0x12, 0x34, 0x81, 0x80, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let header = Header::parse(&wire).unwrap();
    assert_eq!(header.id, 0x1234);
    assert!(header.is_response());
    assert!(header.recursion_desired());
    assert!(header.recursion_available());
    assert_eq!(header.rcode, ResponseCode::NoError);
    assert_eq!(header.qd_count, 1);
    assert_eq!(header.an_count, 0);
    assert_eq!(header.ns_count, 0);
    assert_eq!(header.ar_count, 0);
}

#[test]
fn name_pointer_resolution() {
    // "foo." at offset 0, a pointer back to it at offset 5
    let wire = [0x03, 0x66, 0x6F, 0x6F, 0x00, 0xC0, 0x00];

    let parser = NameParser::new(&wire);
    let name = parser.parse(5).unwrap();
    assert_eq!(name.to_string(), "foo.");
}

#[test]
fn pointer_loops_rejected() {
    let wire = [0xC0, 0x02, 0xC0, 0x00];

    let parser = NameParser::new(&wire);
    assert!(parser.parse(0).is_err());
    assert!(parser.parse(2).is_err());
}

#[test]
fn a_record_round_trip() {
    let record = ResourceRecord::a(
        Name::from_str("example.com").unwrap(),
        300,
        Ipv4Addr::new(93, 184, 216, 34),
    );

    let wire = record.to_wire();
    let (parsed, _) = ResourceRecord::parse(&wire, 0, Instant::now()).unwrap();

    assert_eq!(parsed, record);
    assert_eq!(parsed.rdata().as_a(), Some(Ipv4Addr::new(93, 184, 216, 34)));
}

#[test]
fn reverse_name_from_ipv4() {
    let name = Name::from_reverse_ip(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 5)));

    let labels: Vec<String> = name
        .labels()
        .filter(|l| !l.is_root())
        .map(|l| l.to_string())
        .collect();
    assert_eq!(labels, vec!["5", "2", "0", "192", "in-addr", "arpa"]);
}

#[tokio::test]
async fn private_leak_guard() {
    // A resolver pointed only at a public server must complete a .local
    // query without sending anything, and come back empty.
    let resolver = Resolver::with_nameservers(
        vec![NameserverConfig::new("8.8.8.8".parse().unwrap())],
        ResolutionMode::InsecureOnly,
    );

    let started = Instant::now();
    let result = resolver
        .resolve_query(Question::a(Name::from_str("printer.local").unwrap()))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn known_answer_suppression() {
    let cache = RecordCache::new();
    let service = Name::from_str("_http._tcp.local").unwrap();

    // A PTR with most of its lifetime ahead is attached to the query
    cache.store(ResourceRecord::ptr(
        service.clone(),
        4500,
        Name::from_str("web._http._tcp.local").unwrap(),
    ));

    let query = build_query(&cache, &service, &[RecordType::PTR], false, false);

    assert_eq!(query.id(), 0);
    assert_eq!(query.questions().len(), 1);
    assert_eq!(query.answers().len(), 1);
    assert_eq!(
        query.answers()[0].rdata().as_ptr().unwrap().to_string(),
        "web._http._tcp.local."
    );

    // And the whole thing still survives the wire
    let parsed = Message::parse(&query.to_wire()).unwrap();
    assert_eq!(parsed.answers().len(), 1);
}

#[test]
fn service_instance_naming() {
    let instance = ServiceInstance::new("Front Desk Printer", "_ipp._tcp", "local").unwrap();
    let name = instance.to_name().unwrap();

    let parsed = ServiceInstance::from_name(&name).unwrap();
    assert_eq!(parsed.instance, "Front Desk Printer");
    assert_eq!(parsed.service, "_ipp._tcp");
    assert_eq!(parsed.domain.to_string(), "local.");
}

#[test]
fn message_round_trip_all_sections() {
    let question = Question::a(Name::from_str("www.example.com").unwrap());
    let mut message = Message::response_from(&Message::query(question));

    message.add_answer(ResourceRecord::cname(
        Name::from_str("www.example.com").unwrap(),
        300,
        Name::from_str("example.com").unwrap(),
    ));
    message.add_answer(ResourceRecord::a(
        Name::from_str("example.com").unwrap(),
        300,
        Ipv4Addr::new(93, 184, 216, 34),
    ));
    message.add_additional(ResourceRecord::aaaa(
        Name::from_str("example.com").unwrap(),
        300,
        "2606:2800:21f:cb07:6820:80da:af6b:8b2c".parse().unwrap(),
    ));

    let parsed = Message::parse(&message.to_wire()).unwrap();
    assert_eq!(parsed, message);
    assert_eq!(parsed.cname_target().unwrap().to_string(), "example.com.");
}

#[test]
fn encode_decode_case_preserved_comparison() {
    let name = Name::from_str("MiXeD.CaSe.ExAmPlE").unwrap();
    let mut buf = name.as_wire().to_vec();

    let parser = NameParser::new(&buf);
    let decoded = parser.parse(0).unwrap();
    assert_eq!(decoded, name);

    // Lowercasing the wire still compares equal
    buf.make_ascii_lowercase();
    let parser = NameParser::new(&buf);
    let decoded = parser.parse(0).unwrap();
    assert_eq!(decoded, name);
}
