//! System nameserver discovery.
//!
//! On Unix the platform resolver configuration lives in
//! `/etc/resolv.conf`; the file is read at construction and watched for
//! modification so the nameserver list follows network changes. Other
//! platforms fall back to the public presets.

use crate::NameserverConfig;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::path::Path;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;
use verdin_proto::Name;

/// Where Unix keeps the resolver configuration.
#[cfg(unix)]
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Reads the system nameserver list and the search suffix used for
/// short-name completion.
#[cfg(unix)]
pub fn discover() -> io::Result<(Vec<NameserverConfig>, Option<Name>)> {
    let data = std::fs::read(RESOLV_CONF_PATH)?;
    parse_resolv_conf(&data)
}

/// Parses resolv.conf bytes into nameservers and the first search suffix.
#[cfg(unix)]
pub fn parse_resolv_conf(data: &[u8]) -> io::Result<(Vec<NameserverConfig>, Option<Name>)> {
    use std::str::FromStr;

    let config = resolv_conf::Config::parse(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("resolv.conf: {e}")))?;

    let suffix = config
        .get_last_search_or_domain()
        .next()
        .and_then(|domain| Name::from_str(domain).ok());

    let servers = config
        .nameservers
        .iter()
        .map(|scoped| {
            let mut ns = NameserverConfig::new(scoped.into());
            if let Some(suffix) = &suffix {
                ns = ns.with_search_suffix(suffix.clone());
            }
            ns
        })
        .collect();

    Ok((servers, suffix))
}

/// Non-Unix platforms have no resolv.conf; hand back the presets.
#[cfg(not(unix))]
pub fn discover() -> io::Result<(Vec<NameserverConfig>, Option<Name>)> {
    let mut servers = crate::hints::cloudflare();
    servers.extend(crate::hints::google());
    Ok((servers, None))
}

/// Watches the resolver configuration file for modification.
pub struct ResolvConfWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
}

impl ResolvConfWatcher {
    /// Creates a watcher; call [`ResolvConfWatcher::watch`] to arm it.
    pub fn new() -> notify::Result<Self> {
        let (tx, rx) = channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        Ok(Self {
            watcher,
            receiver: rx,
        })
    }

    /// Starts watching a file.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> notify::Result<()> {
        self.watcher
            .watch(path.as_ref(), RecursiveMode::NonRecursive)
    }

    /// Blocks until the watched file changes; returns true for a
    /// modify/create event, false for anything else, `None` when the
    /// watch backend shut down.
    pub fn wait(&self) -> Option<bool> {
        match self.receiver.recv() {
            Ok(Ok(event)) => Some(event.kind.is_modify() || event.kind.is_create()),
            Ok(Err(_)) => Some(false),
            Err(_) => None,
        }
    }
}
