//! The unicast resolver.
//!
//! Implements iterative resolution: probe the cache, try each
//! configured nameserver in order over the transport the resolution
//! mode selects, follow CNAME chains, and descend delegations using
//! glue records. Network, parse, and transport failures move the loop
//! to the next nameserver; only argument errors and the depth guard
//! surface to callers.

use crate::private::{is_private_address, is_private_question};
use crate::{NameserverConfig, Resolve, ResolutionMode, ResolverError, Result, doh, system};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, instrument, trace, warn};
use verdin_cache::RecordCache;
use verdin_proto::{
    DNS_PORT, Message, Name, OpCode, Question, RecordType, ResourceRecord, Type,
    UDP_RECV_BUFFER_SIZE,
};

/// Maximum recursion depth for CNAME chains and delegations.
const MAX_DEPTH: u8 = 10;

/// Per-attempt wall clock.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Unicast DNS resolver.
///
/// The nameserver list is snapshot-on-read: every call copies the
/// current list before iterating, so concurrent reassignment (user
/// override or a network change) never races a resolution in flight.
pub struct Resolver {
    /// Transport selection.
    mode: ResolutionMode,

    /// Configured nameservers, in contact order.
    servers: RwLock<Arc<Vec<NameserverConfig>>>,

    /// Suffix appended to single-label hosts.
    search_suffix: RwLock<Option<Name>>,

    /// Shared record cache.
    cache: Arc<RecordCache>,

    /// Destination port for plain DNS; overridable for tests.
    port: u16,
}

impl Resolver {
    /// Creates a resolver with nameservers discovered from the host
    /// configuration. Discovery failure leaves the list empty.
    pub fn new(mode: ResolutionMode) -> Self {
        let (servers, suffix) = system::discover().unwrap_or_else(|e| {
            warn!("system nameserver discovery failed: {e}");
            (Vec::new(), None)
        });
        let resolver = Self::with_nameservers(servers, mode);
        *resolver.search_suffix.write() = suffix;
        resolver
    }

    /// Creates a resolver with an explicit nameserver list.
    pub fn with_nameservers(servers: Vec<NameserverConfig>, mode: ResolutionMode) -> Self {
        let suffix = servers.iter().find_map(|s| s.search_suffix.clone());
        Self {
            mode,
            servers: RwLock::new(Arc::new(servers)),
            search_suffix: RwLock::new(suffix),
            cache: Arc::new(RecordCache::new()),
            port: DNS_PORT,
        }
    }

    /// Returns a snapshot of the configured nameservers.
    pub fn nameservers(&self) -> Arc<Vec<NameserverConfig>> {
        self.servers.read().clone()
    }

    /// Replaces the nameserver list.
    pub fn set_nameservers(&self, servers: Vec<NameserverConfig>) {
        *self.servers.write() = Arc::new(servers);
    }

    /// Returns the shared record cache.
    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    /// Re-reads the host resolver configuration.
    pub fn refresh_from_system(&self) -> std::io::Result<()> {
        let (servers, suffix) = system::discover()?;
        debug!(count = servers.len(), "refreshed system nameservers");
        *self.servers.write() = Arc::new(servers);
        *self.search_suffix.write() = suffix;
        Ok(())
    }

    /// Spawns a thread that re-reads the nameserver list whenever the
    /// system resolver configuration changes.
    #[cfg(unix)]
    pub fn spawn_system_watch(self: &Arc<Self>) -> notify::Result<std::thread::JoinHandle<()>> {
        let mut watcher = system::ResolvConfWatcher::new()?;
        watcher.watch(system::RESOLV_CONF_PATH)?;
        let resolver = Arc::clone(self);

        Ok(std::thread::spawn(move || {
            while let Some(changed) = watcher.wait() {
                if changed {
                    if let Err(e) = resolver.refresh_from_system() {
                        warn!("nameserver refresh failed: {e}");
                    }
                }
            }
        }))
    }

    // =========================================================================
    // Public lookups
    // =========================================================================

    /// Resolves a host name to all its addresses (A then AAAA).
    pub async fn resolve_host(&self, host: &str) -> Result<Vec<IpAddr>> {
        let name = self.parse_host(host)?;

        let mut addrs: Vec<IpAddr> = Vec::new();
        if let Some(response) = self.resolve_query(Question::a(name.clone())).await? {
            addrs.extend(response.a_records().map(IpAddr::V4));
        }
        if let Some(response) = self.resolve_query(Question::aaaa(name)).await? {
            addrs.extend(response.aaaa_records().map(IpAddr::V6));
        }
        Ok(addrs)
    }

    /// Resolves a host name to its IPv4 addresses.
    pub async fn resolve_host_v4(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        let name = self.parse_host(host)?;
        Ok(match self.resolve_query(Question::a(name)).await? {
            Some(response) => response.a_records().collect(),
            None => Vec::new(),
        })
    }

    /// Resolves a host name to its IPv6 addresses.
    pub async fn resolve_host_v6(&self, host: &str) -> Result<Vec<Ipv6Addr>> {
        let name = self.parse_host(host)?;
        Ok(match self.resolve_query(Question::aaaa(name)).await? {
            Some(response) => response.aaaa_records().collect(),
            None => Vec::new(),
        })
    }

    /// Resolves an address back to a name via the reverse mapping.
    pub async fn resolve_ip(&self, ip: IpAddr) -> Result<Option<Name>> {
        Ok(self
            .resolve_ip_record(ip)
            .await?
            .and_then(|r| r.rdata().as_ptr().cloned()))
    }

    /// Resolves an address to the full PTR record.
    pub async fn resolve_ip_record(&self, ip: IpAddr) -> Result<Option<ResourceRecord>> {
        let owner = Name::from_reverse_ip(ip);
        let response = self.resolve_query(Question::ptr(owner)).await?;
        Ok(response.and_then(|r| {
            r.answers()
                .iter()
                .find(|a| a.record_type() == Some(RecordType::PTR))
                .cloned()
        }))
    }

    /// Validates a host argument and completes single-label names with
    /// the discovered search suffix.
    fn parse_host(&self, host: &str) -> Result<Name> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ResolverError::InvalidInput("empty host name".into()));
        }

        let name: Name = host
            .parse()
            .map_err(|e| ResolverError::InvalidInput(format!("bad host name: {e}")))?;

        if name.is_single_label() {
            if let Some(suffix) = self.search_suffix.read().clone() {
                if let Ok(completed) = name.join(&suffix) {
                    return Ok(completed);
                }
            }
        }

        Ok(name)
    }

    // =========================================================================
    // Iterative resolution
    // =========================================================================

    /// The query primitive: first usable response, or `None` once every
    /// nameserver is exhausted.
    #[instrument(skip(self), fields(qname = %question.qname, qtype = %question.qtype))]
    pub async fn resolve_query(&self, question: Question) -> Result<Option<Message>> {
        let servers = self.nameservers();
        let sockets = QuerySockets::bind().await;
        self.resolve_inner(question, 1, servers, &sockets).await
    }

    /// One level of the iterative algorithm. `BoxFuture` breaks the
    /// type recursion of CNAME chasing and delegation descent.
    fn resolve_inner<'a>(
        &'a self,
        question: Question,
        depth: u8,
        servers: Arc<Vec<NameserverConfig>>,
        sockets: &'a QuerySockets,
    ) -> BoxFuture<'a, Result<Option<Message>>> {
        async move {
            if depth > MAX_DEPTH {
                return Err(ResolverError::DepthExceeded);
            }

            // Cache probe: a fresh hit is synthesized without touching
            // the network
            let cached = self.cache.search(&question.qname, question.qtype);
            if !cached.is_empty() {
                trace!(qname = %question.qname, hits = cached.len(), "cache hit");
                let now = Instant::now();
                let mut response = Message::response_from(&Message::query(question.clone()));
                for record in cached {
                    response.add_answer(record.with_remaining_ttl(now));
                }
                return Ok(Some(response));
            }

            let private = is_private_question(&question);

            for ns in servers.iter() {
                // Private questions never leave the private namespace
                if private && !is_private_address(ns.address) {
                    debug!(
                        server = %ns.address,
                        qname = %question.qname,
                        "skipping public nameserver for private question"
                    );
                    continue;
                }

                let response = match self.attempt(ns, &question, sockets).await {
                    Ok(response) => response,
                    Err(e) => {
                        debug!(server = %ns.address, error = %e, "attempt failed");
                        continue;
                    }
                };

                // Definitive absence in the legacy shape goes straight
                // back to the caller
                if response.is_nxdomain() && response.opcode() == OpCode::Query {
                    return Ok(Some(response));
                }
                if !response.rcode().is_success() {
                    debug!(server = %ns.address, rcode = %response.rcode(), "unusable rcode");
                    continue;
                }

                // Everything usable feeds the cache
                for record in response
                    .answers()
                    .iter()
                    .chain(response.authorities())
                    .chain(response.additionals())
                {
                    self.cache.store(record.clone());
                }

                // Positive termination: answer of the asked type, or an
                // additional that matches owner and type
                let wanted = question.qtype.to_u16();
                if response
                    .answers()
                    .iter()
                    .any(|r| r.rtype().to_u16() == wanted)
                    || response
                        .additionals()
                        .iter()
                        .any(|r| r.rtype().to_u16() == wanted && r.name() == &question.qname)
                {
                    return Ok(Some(response));
                }

                // CNAME chase: swap the owner, keep the server list
                if question.record_type() != Some(RecordType::CNAME) {
                    if let Some(target) = response.cname_target() {
                        trace!(qname = %question.qname, target = %target, "following CNAME");
                        let mut chased = question.clone();
                        chased.qname = target.clone();
                        return self
                            .resolve_inner(chased, depth + 1, servers.clone(), sockets)
                            .await;
                    }
                }

                // Delegation: no recursion upstream, no answers, but
                // authorities naming the servers to ask next
                if !response.recursion_available()
                    && response.answers().is_empty()
                    && !response.authorities().is_empty()
                {
                    let next = self
                        .delegation_servers(&response, ns.address, depth, &servers, sockets)
                        .await?;
                    if !next.is_empty() {
                        trace!(count = next.len(), "descending delegation");
                        return self
                            .resolve_inner(question, depth + 1, Arc::new(next), sockets)
                            .await;
                    }
                }
            }

            Ok(None)
        }
        .boxed()
    }

    /// Builds the nameserver set for a referral: glue first, then
    /// cache, then a nested address lookup.
    async fn delegation_servers(
        &self,
        response: &Message,
        current: IpAddr,
        depth: u8,
        servers: &Arc<Vec<NameserverConfig>>,
        sockets: &QuerySockets,
    ) -> Result<Vec<NameserverConfig>> {
        let family_v4 = current.is_ipv4();
        let mut next = Vec::new();

        for authority in response.authorities() {
            let Some(ns_name) = (match authority.rdata() {
                verdin_proto::RData::NS(ns) => Some(ns.nsdname()),
                _ => None,
            }) else {
                continue;
            };

            // Glue from the additional section, same family as the
            // server that referred us
            let mut addrs = glue_addresses(response, ns_name, family_v4);

            // Cached addresses
            if addrs.is_empty() {
                let rtype = if family_v4 {
                    RecordType::A
                } else {
                    RecordType::AAAA
                };
                addrs = self
                    .cache
                    .search(ns_name, Type::Known(rtype))
                    .iter()
                    .filter_map(|r| r.rdata().as_ip())
                    .collect();
            }

            // Nested lookup as a last resort
            if addrs.is_empty() {
                let addr_question = if family_v4 {
                    Question::a(ns_name.clone())
                } else {
                    Question::aaaa(ns_name.clone())
                };
                if let Some(reply) = self
                    .resolve_inner(addr_question, depth + 1, servers.clone(), sockets)
                    .await?
                {
                    addrs = reply
                        .answers()
                        .iter()
                        .filter_map(|r| r.rdata().as_ip())
                        .collect();
                }
            }

            next.extend(addrs.into_iter().map(NameserverConfig::new));
        }

        Ok(next)
    }

    // =========================================================================
    // Transports
    // =========================================================================

    /// One attempt against one nameserver, transport per mode.
    async fn attempt(
        &self,
        ns: &NameserverConfig,
        question: &Question,
        sockets: &QuerySockets,
    ) -> Result<Message> {
        match self.mode {
            ResolutionMode::InsecureOnly => self.query_udp(sockets, ns.address, question).await,
            ResolutionMode::SecureOnly => self.query_doh(ns.address, question).await,
            ResolutionMode::SecureWithFallback => {
                if ns.doh == Some(false) {
                    return self.query_udp(sockets, ns.address, question).await;
                }
                match self.query_doh(ns.address, question).await {
                    Ok(response) => Ok(response),
                    Err(e) if e.is_fallback_worthy() => {
                        debug!(server = %ns.address, error = %e, "DoH failed, falling back to UDP");
                        self.query_udp(sockets, ns.address, question).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Single-shot UDP exchange with the per-attempt timeout.
    async fn query_udp(
        &self,
        sockets: &QuerySockets,
        addr: IpAddr,
        question: &Question,
    ) -> Result<Message> {
        let socket = sockets.for_addr(addr)?;
        let target = SocketAddr::new(addr, self.port);

        let query = Message::query(question.clone());
        socket.send_to(&query.to_wire(), target).await?;

        let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];
        timeout(ATTEMPT_TIMEOUT, async {
            loop {
                let (len, src) = socket.recv_from(&mut buf).await?;
                if src != target {
                    trace!(src = %src, "dropping datagram from unexpected source");
                    continue;
                }
                // Truncated or malformed replies are errors here; the
                // caller moves to the next nameserver
                let response = Message::parse(&buf[..len])?;
                if response.id() != query.id() {
                    trace!("dropping response with mismatched id");
                    continue;
                }
                return Ok(response);
            }
        })
        .await
        .map_err(|_| ResolverError::Timeout)?
    }

    /// DoH exchange; the body is a transaction-id-zero wire message.
    async fn query_doh(&self, addr: IpAddr, question: &Question) -> Result<Message> {
        let mut query = Message::query(question.clone());
        query.set_id(0);
        doh::post_wire(addr, query.to_wire(), ATTEMPT_TIMEOUT).await
    }
}

#[async_trait]
impl Resolve for Resolver {
    async fn resolve_query(&self, question: Question) -> Result<Option<Message>> {
        Resolver::resolve_query(self, question).await
    }
}

/// The UDP sockets scoped to a single `resolve_query` call.
///
/// One socket per address family; both are released when the call
/// returns.
struct QuerySockets {
    v4: Option<UdpSocket>,
    v6: Option<UdpSocket>,
}

impl QuerySockets {
    async fn bind() -> Self {
        Self {
            v4: UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await.ok(),
            v6: UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0)).await.ok(),
        }
    }

    fn for_addr(&self, addr: IpAddr) -> Result<&UdpSocket> {
        let socket = if addr.is_ipv4() {
            self.v4.as_ref()
        } else {
            self.v6.as_ref()
        };
        socket.ok_or_else(|| {
            ResolverError::Transport(format!("no local socket for address family of {addr}"))
        })
    }
}

/// Addresses for `ns_name` gleaned from the additional section,
/// restricted to the referring server's address family.
fn glue_addresses(response: &Message, ns_name: &Name, family_v4: bool) -> Vec<IpAddr> {
    response
        .additionals()
        .iter()
        .filter(|r| r.name() == ns_name)
        .filter_map(|r| r.rdata().as_ip())
        .filter(|ip| ip.is_ipv4() == family_v4)
        .collect()
}
