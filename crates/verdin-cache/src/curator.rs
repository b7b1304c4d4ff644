//! The cache curator task.

use crate::{CacheEvent, RecordCache};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Spawns the curator loop for `cache`.
///
/// Every sweep interval (4 s by default) the curator evicts expired
/// records, marks records approaching expiry as stale, and forwards the
/// resulting [`CacheEvent`]s to `events`. The task exits when
/// `shutdown` flips to true or every event receiver is gone.
pub fn spawn_curator(
    cache: Arc<RecordCache>,
    events: mpsc::UnboundedSender<CacheEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cache.config().curator_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let swept = cache.curate(Instant::now());
                    if !swept.is_empty() {
                        trace!(events = swept.len(), "curator sweep");
                    }
                    for event in swept {
                        if events.send(event).is_err() {
                            debug!("curator event channel closed, stopping");
                            return;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("curator shutting down");
                        return;
                    }
                }
            }
        }
    })
}
