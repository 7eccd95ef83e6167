//! Background eviction of abandoned split streams.
//!
//! The registry never evicts on its own clock: a sender that starts a split
//! stream and goes silent would otherwise pin its buffer forever. Each
//! client runs one reaper task that sweeps every registry in the
//! [`ConnectionTable`](crate::session::ConnectionTable) on a fixed tick
//! until cancelled.

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::ConnectionTable;

/// Sweep `table` every `period`, evicting expired streams, until `shutdown`
/// is cancelled.
///
/// Registry locks are taken one at a time and never held across a tick, so
/// connection pumps only ever contend with the sweep of their own
/// connection.
pub async fn run(table: Arc<ConnectionTable>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => sweep(&table).await,
        }
    }

    debug!("split stream reaper stopped");
}

async fn sweep(table: &ConnectionTable) {
    let mut evicted = 0_usize;
    for registry in table.handles() {
        evicted += registry.lock().await.purge_expired().len();
    }
    if evicted > 0 {
        debug!(evicted, "reaper evicted abandoned split streams");
    }
}
