//! Background expiry of stored reports.
//!
//! A single long-lived task sweeps the report store on a fixed interval and
//! deletes entries older than the configured TTL. The sweep itself is
//! [`ReportStore::remove_expired`], which takes the current time as a
//! parameter so tests can simulate time passage without real delay.
//!
//! Snapshot blobs are deliberately not swept; they live until overwritten.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::ReportStore;

// ============================================================================
// ReportReaper
// ============================================================================

/// Periodic eviction of expired report entries.
pub struct ReportReaper {
    store: ReportStore,
    expiry: chrono::Duration,
    sweep_interval: Duration,
}

impl ReportReaper {
    pub fn new(store: ReportStore, expiry_seconds: u64, sweep_interval_seconds: u64) -> Self {
        Self {
            store,
            expiry: chrono::Duration::seconds(expiry_seconds as i64),
            sweep_interval: Duration::from_secs(sweep_interval_seconds),
        }
    }

    /// Spawn the sweep loop.
    ///
    /// Runs until `shutdown_rx` observes `true`. Each sweep holds the store
    /// lock only long enough to collect and delete expired identifiers, so
    /// ingestion is never blocked for the duration of a sweep.
    pub fn spawn(self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.sweep_interval);
            interval.tick().await; // skip immediate tick

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = self.store.remove_expired(Utc::now(), self.expiry);
                        if removed > 0 {
                            info!(removed, "Removed expired reports");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("Report reaper stopped");
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
