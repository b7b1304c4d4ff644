//! DNS-over-HTTPS transport (RFC 8484).
//!
//! POSTs the raw wire message to `https://<host-literal>/dns-query`
//! over HTTP/2, with `application/dns-message` bodies both ways. The
//! TLS endpoint is authenticated against the webpki root set by IP
//! certificate identity, so no hostname configuration is needed.

use crate::{ResolverError, Result};
use bytes::{Bytes, BytesMut};
use h2::client::SendRequest;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use once_cell::sync::Lazy;
use rustls::pki_types::ServerName;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};
use verdin_proto::Message;

/// The DoH media type (RFC 8484 Section 6).
const MIME_DNS_MESSAGE: &str = "application/dns-message";

/// HTTPS port.
const DOH_PORT: u16 = 443;

static TLS_CONFIG: Lazy<Arc<rustls::ClientConfig>> = Lazy::new(|| {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];

    Arc::new(config)
});

/// POSTs `wire` to the DoH endpoint at `addr` and parses the reply.
///
/// The whole exchange (connect, TLS, request, body) is bounded by
/// `timeout`; timeouts and HTTP failures surface as the corresponding
/// [`ResolverError`] so the caller can decide whether to fall back.
pub(crate) async fn post_wire(addr: IpAddr, wire: Bytes, timeout: Duration) -> Result<Message> {
    match tokio::time::timeout(timeout, exchange(addr, wire)).await {
        Ok(result) => result,
        Err(_) => Err(ResolverError::Timeout),
    }
}

async fn exchange(addr: IpAddr, wire: Bytes) -> Result<Message> {
    let mut h2 = connect(addr).await?;

    let host = host_literal(addr);
    let request = http::Request::builder()
        .method(http::Method::POST)
        .version(http::Version::HTTP_2)
        .uri(format!("https://{host}/dns-query"))
        .header(CONTENT_TYPE, MIME_DNS_MESSAGE)
        .header(ACCEPT, MIME_DNS_MESSAGE)
        .header(CONTENT_LENGTH, wire.len())
        .body(())
        .map_err(|e| ResolverError::Transport(format!("bad http request: {e}")))?;

    trace!(server = %addr, bytes = wire.len(), "DoH POST");

    let (response, mut send_stream) = h2
        .send_request(request, false)
        .map_err(|e| ResolverError::Transport(format!("h2 send_request: {e}")))?;

    send_stream
        .send_data(wire, true)
        .map_err(|e| ResolverError::Transport(format!("h2 send_data: {e}")))?;

    let response = response
        .await
        .map_err(|e| ResolverError::Transport(format!("h2 response: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ResolverError::Transport(format!(
            "http status {status}"
        )));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(MIME_DNS_MESSAGE);
    if content_type != MIME_DNS_MESSAGE {
        return Err(ResolverError::Transport(format!(
            "unexpected content type {content_type}"
        )));
    }

    let mut body = response.into_body();
    let mut bytes = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| ResolverError::Transport(format!("h2 body: {e}")))?;
        let _ = body.flow_control().release_capacity(chunk.len());
        bytes.extend_from_slice(&chunk);
    }

    debug!(server = %addr, bytes = bytes.len(), "DoH reply");

    Ok(Message::parse(&bytes)?)
}

/// Opens the TLS/h2 channel to `addr`.
async fn connect(addr: IpAddr) -> Result<SendRequest<Bytes>> {
    let tcp = TcpStream::connect((addr, DOH_PORT)).await?;

    let server_name = ServerName::IpAddress(addr.into());
    let tls = TlsConnector::from(TLS_CONFIG.clone())
        .connect(server_name, tcp)
        .await?;

    let (h2, connection) = h2::client::handshake(tls)
        .await
        .map_err(|e| ResolverError::Transport(format!("h2 handshake: {e}")))?;

    // The connection task owns the socket for the life of the exchange
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            trace!("h2 connection closed: {e}");
        }
    });

    h2.ready()
        .await
        .map_err(|e| ResolverError::Transport(format!("h2 ready: {e}")))
}

/// Renders an address as a URI host literal (IPv6 gets brackets).
fn host_literal(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    }
}
