//! The multicast DNS client.
//!
//! One listener socket per address family, bound to port 5353 with
//! address reuse, joined to the link-local groups on every configured
//! interface. Sender sockets are bound per interface address so
//! queries leave on each eligible link. Every received datagram flows
//! through source-port validation, the duplicate filter, and the
//! passive cache before reaching subscribers as events.

use crate::dedup::DuplicateFilter;
use crate::event::ClientEvent;
use crate::pool::BufferPool;
use crate::sd::{self, ServiceInstance, build_query};
use crate::{MdnsError, Result};
use parking_lot::Mutex;
use socket2::{Domain, Protocol, SockAddr, Socket, Type as SocketType};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use verdin_cache::{CacheEvent, RecordCache, spawn_curator};
use verdin_proto::{
    MDNS_IPV4_RECV_BUFFER_SIZE, MDNS_IPV6_RECV_BUFFER_SIZE, MDNS_PORT, MDNS_SEND_BUFFER_SIZE,
    Message, Name, Question, RecordType, Type,
};

/// The mDNS IPv4 group (RFC 6762 Section 3).
pub const MDNS_GROUP_V4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The mDNS IPv6 link-local group.
pub const MDNS_GROUP_V6: Ipv6Addr = Ipv6Addr::new(0xFF02, 0, 0, 0, 0, 0, 0, 0x00FB);

/// Multicast client configuration.
#[derive(Debug, Clone)]
pub struct MdnsConfig {
    /// IPv4 interface addresses to join and send on; empty joins on the
    /// default interface.
    pub interfaces_v4: Vec<Ipv4Addr>,

    /// IPv6 interface scope ids to join and send on; empty joins with
    /// scope 0 (default interface).
    pub interfaces_v6: Vec<u32>,

    /// Whether the platform delivers unicast responses reliably; when
    /// false the unicast-response bit is masked off outgoing questions.
    pub unicast_supported: bool,

    /// How long resolve operations wait for responses.
    pub answer_wait: Duration,

    /// Pause between sends on consecutive sender sockets.
    pub send_pause: Duration,

    /// Default suffix for single-label host lookups.
    pub domain: Name,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            interfaces_v4: Vec::new(),
            interfaces_v6: Vec::new(),
            unicast_supported: false,
            answer_wait: Duration::from_secs(3),
            send_pause: Duration::from_millis(5),
            domain: Name::from_str("local").expect("static name"),
        }
    }
}

/// A service instance resolved down to host, port, metadata, and
/// addresses.
#[derive(Debug, Clone)]
pub struct ResolvedInstance {
    /// The fully qualified instance name.
    pub name: Name,
    /// The host carrying the service.
    pub host: Name,
    /// The service port.
    pub port: u16,
    /// TXT metadata strings, wire order.
    pub txt: Vec<Vec<u8>>,
    /// Host addresses learned so far.
    pub addresses: Vec<IpAddr>,
}

/// Multicast DNS client.
///
/// Construct, [`start`](MulticastClient::start), then query; events
/// stream to every [`subscribe`](MulticastClient::subscribe)d receiver.
/// [`stop`](MulticastClient::stop) cancels the receive loops and the
/// curator and releases every socket; dropping the client stops it.
pub struct MulticastClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: MdnsConfig,
    cache: Arc<RecordCache>,
    dedup: DuplicateFilter,
    events: broadcast::Sender<ClientEvent>,
    send_pool: Arc<BufferPool>,
    senders: Mutex<Vec<Arc<UdpSocket>>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl MulticastClient {
    /// Creates a client with its own cache.
    pub fn new(config: MdnsConfig) -> Self {
        Self::with_cache(config, Arc::new(RecordCache::new()))
    }

    /// Creates a client observing into a shared cache.
    pub fn with_cache(config: MdnsConfig, cache: Arc<RecordCache>) -> Self {
        let (events, _) = broadcast::channel(64);
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(ClientInner {
                config,
                cache,
                dedup: DuplicateFilter::new(),
                events,
                send_pool: BufferPool::new(MDNS_SEND_BUFFER_SIZE),
                senders: Mutex::new(Vec::new()),
                shutdown,
                tasks: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the shared record cache.
    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.inner.cache
    }

    /// Subscribes to the client's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Binds the listeners and senders and spawns the receive loops and
    /// the cache curator.
    pub async fn start(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(MdnsError::AlreadyStarted);
        }

        let inner = &self.inner;
        let mut tasks = Vec::new();

        // IPv4 listener is mandatory
        let listener_v4 = Arc::new(bind_listener_v4(&inner.config.interfaces_v4)?);
        tasks.push(tokio::spawn(receive_loop(
            Arc::clone(inner),
            listener_v4,
            MDNS_IPV4_RECV_BUFFER_SIZE,
            inner.shutdown.subscribe(),
        )));

        // IPv6 is best-effort; plenty of hosts have no v6 stack
        match bind_listener_v6(&inner.config.interfaces_v6) {
            Ok(listener_v6) => {
                tasks.push(tokio::spawn(receive_loop(
                    Arc::clone(inner),
                    Arc::new(listener_v6),
                    MDNS_IPV6_RECV_BUFFER_SIZE,
                    inner.shutdown.subscribe(),
                )));
            }
            Err(e) => warn!("IPv6 mDNS listener unavailable: {e}"),
        }

        // Sender sockets, one per interface address
        let mut senders = Vec::new();
        let v4_ifaces = if inner.config.interfaces_v4.is_empty() {
            vec![Ipv4Addr::UNSPECIFIED]
        } else {
            inner.config.interfaces_v4.clone()
        };
        for iface in v4_ifaces {
            match bind_sender_v4(iface) {
                Ok(socket) => senders.push(Arc::new(socket)),
                Err(e) => warn!(iface = %iface, "mDNS sender unavailable: {e}"),
            }
        }
        let v6_scopes = if inner.config.interfaces_v6.is_empty() {
            vec![0]
        } else {
            inner.config.interfaces_v6.clone()
        };
        for scope in v6_scopes {
            match bind_sender_v6(scope) {
                Ok(socket) => senders.push(Arc::new(socket)),
                Err(e) => debug!(scope, "IPv6 mDNS sender unavailable: {e}"),
            }
        }
        if senders.is_empty() {
            self.inner.started.store(false, Ordering::SeqCst);
            return Err(MdnsError::Socket(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no usable mDNS sender socket",
            )));
        }
        *inner.senders.lock() = senders;

        // Curator and the refresh consumer it feeds
        let (cache_tx, cache_rx) = mpsc::unbounded_channel();
        tasks.push(spawn_curator(
            Arc::clone(&inner.cache),
            cache_tx,
            inner.shutdown.subscribe(),
        ));
        tasks.push(tokio::spawn(refresh_loop(
            Arc::clone(inner),
            cache_rx,
            inner.shutdown.subscribe(),
        )));

        *inner.tasks.lock() = tasks;
        debug!("multicast client started");
        Ok(())
    }

    /// Cancels the receive loops and curator, closes every socket, and
    /// clears the sender list.
    pub fn stop(&self) {
        if !self.inner.started.swap(false, Ordering::SeqCst) {
            return;
        }

        let _ = self.inner.shutdown.send(true);
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
        self.inner.senders.lock().clear();
        let _ = self.inner.shutdown.send_replace(false);
        debug!("multicast client stopped");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sends a query message to the multicast groups.
    ///
    /// The message is forced onto the multicast wire shape: transaction
    /// id zero, RD and RA clear, unicast-response masked when the
    /// platform cannot honor it.
    pub async fn send_query(&self, message: Message) -> Result<()> {
        if !self.inner.started.load(Ordering::SeqCst) {
            return Err(MdnsError::NotStarted);
        }
        self.inner.send(message).await
    }

    /// Enumerates service types in `domain` via the DNS-SD meta-query.
    pub async fn query_services(&self, domain: &Name, unicast: bool) -> Result<()> {
        let name = Name::from_str(sd::SERVICE_ENUMERATION)?.join(domain)?;
        let message = build_query(
            &self.inner.cache,
            &name,
            &[RecordType::PTR],
            unicast,
            self.inner.config.unicast_supported,
        );
        self.send_query(message).await
    }

    /// Queries for instances of one service, with known answers
    /// attached so responders may suppress.
    pub async fn query_service(&self, service: &str, domain: &str) -> Result<()> {
        let domain = Name::from_str(domain)
            .map_err(|e| MdnsError::InvalidInput(format!("bad domain: {e}")))?;
        let name = sd::service_name(service, &domain)?;
        let message = build_query(
            &self.inner.cache,
            &name,
            &[RecordType::PTR],
            false,
            self.inner.config.unicast_supported,
        );
        self.send_query(message).await
    }

    /// Queries one service instance for the given record types.
    ///
    /// When cached known answers already satisfy every requested type,
    /// a synthetic response is returned and nothing goes on the wire.
    pub async fn query_service_instance(
        &self,
        instance: &ServiceInstance,
        types: &[RecordType],
    ) -> Result<Option<Message>> {
        if types.is_empty() {
            return Err(MdnsError::InvalidInput("no record types requested".into()));
        }
        let name = instance.to_name()?;

        // Fully satisfied out of the cache: synthesize instead of asking
        let known = self.inner.cache.known_answers(&name, types);
        let satisfied = types.iter().all(|t| {
            known
                .iter()
                .any(|r| r.record_type() == Some(*t))
        });
        if satisfied {
            let question = Question::new(
                name,
                types[0],
                verdin_proto::RecordClass::IN,
            );
            let mut response = Message::response_from(&Message::multicast_query(question));
            response.add_answers(known);
            return Ok(Some(response));
        }

        // One query per requested type
        for &rtype in types {
            let message = build_query(
                &self.inner.cache,
                &name,
                &[rtype],
                false,
                self.inner.config.unicast_supported,
            );
            self.send_query(message).await?;
        }
        Ok(None)
    }

    /// Resolves a service instance to host, port, metadata, and
    /// addresses, waiting up to the answer window.
    pub async fn resolve_service_instance(
        &self,
        instance: &ServiceInstance,
    ) -> Result<Option<ResolvedInstance>> {
        let name = instance.to_name()?;

        let srv_response = self.resolve_query(Question::srv(name.clone())).await?;
        let srv = srv_response.as_ref().and_then(|m| {
            m.answers()
                .iter()
                .find(|r| r.name() == &name)
                .and_then(|r| r.rdata().as_srv())
        });
        let Some(srv) = srv else {
            return Ok(None);
        };

        let host = srv.target().clone();
        let port = srv.port();

        let txt = self
            .inner
            .cache
            .search(&name, Type::Known(RecordType::TXT))
            .iter()
            .filter_map(|r| r.rdata().as_txt().map(|t| t.strings().to_vec()))
            .next()
            .unwrap_or_default();

        let mut addresses: Vec<IpAddr> = self
            .inner
            .cache
            .search(&host, Type::Known(RecordType::A))
            .iter()
            .filter_map(|r| r.rdata().as_ip())
            .collect();
        addresses.extend(
            self.inner
                .cache
                .search(&host, Type::Known(RecordType::AAAA))
                .iter()
                .filter_map(|r| r.rdata().as_ip()),
        );

        Ok(Some(ResolvedInstance {
            name,
            host,
            port,
            txt,
            addresses,
        }))
    }

    /// Resolves a host name over multicast (single labels get the
    /// default suffix).
    pub async fn resolve_host(&self, host: &str) -> Result<Vec<IpAddr>> {
        let host = host.trim();
        if host.is_empty() {
            return Err(MdnsError::InvalidInput("empty host name".into()));
        }
        let mut name: Name = host
            .parse()
            .map_err(|e| MdnsError::InvalidInput(format!("bad host name: {e}")))?;
        if name.is_single_label() {
            name = name.join(&self.inner.config.domain)?;
        }

        let mut addrs: Vec<IpAddr> = Vec::new();
        if let Some(response) = self.resolve_query(Question::a(name.clone())).await? {
            addrs.extend(response.a_records().map(IpAddr::V4));
        }
        if let Some(response) = self.resolve_query(Question::aaaa(name)).await? {
            addrs.extend(response.aaaa_records().map(IpAddr::V6));
        }
        Ok(addrs)
    }

    /// Resolves an address back to a host name over multicast.
    pub async fn resolve_ip(&self, ip: IpAddr) -> Result<Option<Name>> {
        let response = self.resolve_inverse_query(ip).await?;
        Ok(response.and_then(|m| {
            m.answers()
                .iter()
                .find_map(|r| r.rdata().as_ptr().cloned())
        }))
    }

    /// Issues a question and waits up to the answer window for a
    /// response that answers it.
    pub async fn resolve_query(&self, question: Question) -> Result<Option<Message>> {
        if !self.inner.started.load(Ordering::SeqCst) {
            return Err(MdnsError::NotStarted);
        }
        let Some(rtype) = question.record_type() else {
            return Err(MdnsError::InvalidInput("unknown query type".into()));
        };

        // Subscribe before sending so no response can slip past
        let mut events = self.inner.events.subscribe();

        let message = build_query(
            &self.inner.cache,
            &question.qname,
            &[rtype],
            question.unicast_response,
            self.inner.config.unicast_supported,
        );
        self.inner.send(message).await?;

        let deadline = Instant::now() + self.inner.config.answer_wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match timeout(remaining, events.recv()).await {
                Ok(Ok(ClientEvent::Answer { message, .. })) => {
                    let answered = message
                        .answers()
                        .iter()
                        .any(|r| question.is_answered_by(r.name(), r.rtype()));
                    if answered {
                        return Ok(Some(message));
                    }
                }
                Ok(Ok(_)) => continue,
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    trace!(skipped, "resolve listener lagged");
                    continue;
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return Ok(None),
                Err(_) => return Ok(None),
            }
        }
    }

    /// Issues a reverse (PTR) query for an address.
    pub async fn resolve_inverse_query(&self, ip: IpAddr) -> Result<Option<Message>> {
        self.resolve_query(Question::ptr(Name::from_reverse_ip(ip)))
            .await
    }
}

impl Drop for MulticastClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ClientInner {
    fn publish(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    /// Serializes and sends a message on every sender socket, pacing
    /// consecutive sends to reduce burst collisions.
    async fn send(&self, mut message: Message) -> Result<()> {
        message.set_id(0);
        message.header_mut().set_recursion_desired(false);
        message.header_mut().set_recursion_available(false);
        if !self.config.unicast_supported {
            for question in message.questions_mut() {
                question.unicast_response = false;
            }
        }

        let mut buf = self.send_pool.acquire();
        message.write_to(&mut buf);

        let senders: Vec<_> = self.senders.lock().clone();
        let mut first = true;
        for socket in senders {
            if !first {
                tokio::time::sleep(self.config.send_pause).await;
            }
            first = false;

            let group: SocketAddr = match socket.local_addr() {
                Ok(addr) if addr.is_ipv6() => (MDNS_GROUP_V6, MDNS_PORT).into(),
                _ => (MDNS_GROUP_V4, MDNS_PORT).into(),
            };
            if let Err(e) = socket.send_to(&buf, group).await {
                self.publish(ClientEvent::Error {
                    message: format!("send failed: {e}"),
                    from: None,
                });
            }
        }
        Ok(())
    }

    /// Processes one received datagram.
    fn handle_datagram(&self, data: &[u8], src: SocketAddr) {
        // Datagrams not sourced from the mDNS port are not mDNS
        if src.port() != MDNS_PORT {
            trace!(src = %src, "dropping datagram from non-mDNS source port");
            return;
        }

        let message = match Message::parse(data) {
            Ok(message) => message,
            Err(e) => {
                trace!(src = %src, error = %e, "dropping unparseable datagram");
                return;
            }
        };

        if self.dedup.is_duplicate(&message, src) {
            trace!(src = %src, "dropping duplicate datagram");
            return;
        }

        if message.is_response()
            && message.rcode().is_success()
            && (!message.answers().is_empty() || !message.additionals().is_empty())
        {
            let mut added = Vec::new();
            let mut updated = Vec::new();

            for record in message.answers().iter().chain(message.additionals()) {
                match self.cache.store(record.clone()) {
                    verdin_cache::StoreOutcome::NewData => added.push(record.clone()),
                    verdin_cache::StoreOutcome::Update => updated.push(record.clone()),
                    verdin_cache::StoreOutcome::NoUpdate => {}
                }
            }

            self.publish(ClientEvent::Answer {
                from: src,
                message,
                added,
                updated,
            });
        } else if message.is_query() && !message.questions().is_empty() {
            self.publish(ClientEvent::Query { from: src, message });
        }
    }
}

/// Receive task: one per listener socket.
async fn receive_loop(
    inner: Arc<ClientInner>,
    socket: Arc<UdpSocket>,
    buffer_size: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; buffer_size];
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, src)) => inner.handle_datagram(&buf[..len], src),
                Err(e) => {
                    inner.publish(ClientEvent::Error {
                        message: format!("receive failed: {e}"),
                        from: None,
                    });
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Consumes curator events: republishes them and keeps live service
/// records fresh by re-querying before they expire.
async fn refresh_loop(
    inner: Arc<ClientInner>,
    mut cache_events: mpsc::UnboundedReceiver<CacheEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
            event = cache_events.recv() => match event {
                None => return,
                Some(CacheEvent::RefreshDue { name, types }) => {
                    inner.publish(ClientEvent::RefreshDue {
                        name: name.clone(),
                        types: types.clone(),
                    });

                    // Service records get refreshed without caller help
                    let service_like = types
                        .iter()
                        .any(|t| matches!(t, RecordType::SRV | RecordType::TXT));
                    if service_like && ServiceInstance::from_name(&name).is_some() {
                        debug!(owner = %name, "refreshing service instance records");
                        let message = build_query(
                            &inner.cache,
                            &name,
                            &[
                                RecordType::SRV,
                                RecordType::A,
                                RecordType::AAAA,
                                RecordType::TXT,
                            ],
                            false,
                            inner.config.unicast_supported,
                        );
                        if let Err(e) = inner.send(message).await {
                            trace!("refresh query failed: {e}");
                        }
                    }
                }
                Some(CacheEvent::Expired { name }) => {
                    inner.publish(ClientEvent::Expired { name });
                }
            }
        }
    }
}

// =========================================================================
// Socket construction
// =========================================================================

fn new_udp_socket(domain: Domain) -> io::Result<Socket> {
    let socket = Socket::new(domain, SocketType::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Listener bound to 0.0.0.0:5353, joined to 224.0.0.251 on each
/// interface (or the default interface when none are given).
fn bind_listener_v4(interfaces: &[Ipv4Addr]) -> io::Result<UdpSocket> {
    let socket = new_udp_socket(Domain::IPV4)?;

    if interfaces.is_empty() {
        socket.join_multicast_v4(&MDNS_GROUP_V4, &Ipv4Addr::UNSPECIFIED)?;
    } else {
        for iface in interfaces {
            socket.join_multicast_v4(&MDNS_GROUP_V4, iface)?;
        }
    }
    socket.set_multicast_loop_v4(false)?;

    socket.bind(&SockAddr::from(SocketAddr::from((
        Ipv4Addr::UNSPECIFIED,
        MDNS_PORT,
    ))))?;

    debug!("joined {MDNS_GROUP_V4} on port {MDNS_PORT}");
    UdpSocket::from_std(socket.into())
}

/// Listener bound to [::]:5353, joined to ff02::fb on each scope.
fn bind_listener_v6(scopes: &[u32]) -> io::Result<UdpSocket> {
    let socket = new_udp_socket(Domain::IPV6)?;
    socket.set_only_v6(true)?;

    if scopes.is_empty() {
        socket.join_multicast_v6(&MDNS_GROUP_V6, 0)?;
    } else {
        for &scope in scopes {
            socket.join_multicast_v6(&MDNS_GROUP_V6, scope)?;
        }
    }
    socket.set_multicast_loop_v6(false)?;

    socket.bind(&SockAddr::from(SocketAddr::from((
        Ipv6Addr::UNSPECIFIED,
        MDNS_PORT,
    ))))?;

    debug!("joined {MDNS_GROUP_V6} on port {MDNS_PORT}");
    UdpSocket::from_std(socket.into())
}

/// Sender bound to (interface address, 5353).
fn bind_sender_v4(iface: Ipv4Addr) -> io::Result<UdpSocket> {
    let socket = new_udp_socket(Domain::IPV4)?;
    if !iface.is_unspecified() {
        socket.set_multicast_if_v4(&iface)?;
    }
    socket.set_multicast_loop_v4(false)?;
    socket.bind(&SockAddr::from(SocketAddr::from((iface, MDNS_PORT))))?;
    UdpSocket::from_std(socket.into())
}

/// Sender bound to ([::], 5353) on one interface scope.
fn bind_sender_v6(scope: u32) -> io::Result<UdpSocket> {
    let socket = new_udp_socket(Domain::IPV6)?;
    socket.set_only_v6(true)?;
    if scope != 0 {
        socket.set_multicast_if_v6(scope)?;
    }
    socket.set_multicast_loop_v6(false)?;
    socket.bind(&SockAddr::from(SocketAddr::from((
        Ipv6Addr::UNSPECIFIED,
        MDNS_PORT,
    ))))?;
    UdpSocket::from_std(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdin_proto::{RData, ResourceRecord};

    fn mdns_src() -> SocketAddr {
        "192.168.1.20:5353".parse().unwrap()
    }

    fn answer_message(owner: &str, addr: Ipv4Addr) -> Message {
        let name = Name::from_str(owner).unwrap();
        let mut response =
            Message::response_from(&Message::multicast_query(Question::a(name.clone())));
        response.add_answer(ResourceRecord::a(name, 120, addr));
        response
    }

    #[tokio::test]
    async fn test_datagram_flows_to_cache_and_events() {
        let client = MulticastClient::new(MdnsConfig::default());
        let mut events = client.subscribe();

        let message = answer_message("host.local", Ipv4Addr::new(169, 254, 0, 9));
        client
            .inner
            .handle_datagram(&message.to_wire(), mdns_src());

        let cached = client.cache().search(
            &Name::from_str("host.local").unwrap(),
            Type::Known(RecordType::A),
        );
        assert_eq!(cached.len(), 1);

        match events.try_recv().unwrap() {
            ClientEvent::Answer { from, added, updated, .. } => {
                assert_eq!(from, mdns_src());
                assert_eq!(added.len(), 1);
                assert!(updated.is_empty());
            }
            other => panic!("expected answer event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeat_answer_reports_update() {
        let client = MulticastClient::new(MdnsConfig::default());
        let mut events = client.subscribe();

        let message = answer_message("host.local", Ipv4Addr::new(169, 254, 0, 9));
        client
            .inner
            .handle_datagram(&message.to_wire(), mdns_src());

        // Same record from a different responder is an update
        let other_src: SocketAddr = "192.168.1.21:5353".parse().unwrap();
        client
            .inner
            .handle_datagram(&message.to_wire(), other_src);

        let _ = events.try_recv().unwrap();
        match events.try_recv().unwrap() {
            ClientEvent::Answer { added, updated, .. } => {
                assert!(added.is_empty());
                assert_eq!(updated.len(), 1);
            }
            other => panic!("expected answer event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_source_port_dropped() {
        let client = MulticastClient::new(MdnsConfig::default());
        let mut events = client.subscribe();

        let message = answer_message("host.local", Ipv4Addr::new(169, 254, 0, 9));
        client
            .inner
            .handle_datagram(&message.to_wire(), "192.168.1.20:1234".parse().unwrap());

        assert!(client.cache().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_duplicate_datagram_dropped() {
        let client = MulticastClient::new(MdnsConfig::default());
        let mut events = client.subscribe();

        let message = answer_message("host.local", Ipv4Addr::new(169, 254, 0, 9));
        client
            .inner
            .handle_datagram(&message.to_wire(), mdns_src());
        client
            .inner
            .handle_datagram(&message.to_wire(), mdns_src());

        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_query_event_published() {
        let client = MulticastClient::new(MdnsConfig::default());
        let mut events = client.subscribe();

        let query = Message::multicast_query(Question::ptr(
            Name::from_str("_http._tcp.local").unwrap(),
        ));
        client.inner.handle_datagram(&query.to_wire(), mdns_src());

        assert!(matches!(
            events.try_recv().unwrap(),
            ClientEvent::Query { .. }
        ));
    }

    #[tokio::test]
    async fn test_garbage_swallowed() {
        let client = MulticastClient::new(MdnsConfig::default());
        let mut events = client.subscribe();

        client.inner.handle_datagram(&[0xFF; 7], mdns_src());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_query_before_start_rejected() {
        let client = MulticastClient::new(MdnsConfig::default());
        let result = client
            .resolve_query(Question::a(Name::from_str("host.local").unwrap()))
            .await;
        assert!(matches!(result, Err(MdnsError::NotStarted)));
    }

    #[tokio::test]
    async fn test_instance_query_satisfied_from_cache() {
        let client = MulticastClient::new(MdnsConfig::default());
        let instance =
            ServiceInstance::new("Web Server", "_http._tcp", "local").unwrap();
        let name = instance.to_name().unwrap();

        client.cache().store(ResourceRecord::srv(
            name.clone(),
            120,
            0,
            0,
            8080,
            Name::from_str("host.local").unwrap(),
        ));
        client.cache().store(ResourceRecord::new(
            name.clone(),
            120,
            RData::TXT(verdin_proto::rdata::TXT::single("path=/")),
        ));

        // Both requested types cached and fresh: synthetic response, no
        // sockets needed even though the client never started
        let response = client
            .query_service_instance(&instance, &[RecordType::SRV, RecordType::TXT])
            .await
            .unwrap()
            .expect("cache should satisfy the query");

        assert_eq!(response.answers().len(), 2);
    }
}
