//! In-memory report storage.
//!
//! A lock-guarded map from task identifier to stored report. Entries carry a
//! server-assigned arrival timestamp used solely for TTL expiry; the report's
//! own `timestamp` field is client-supplied and plays no role in eviction.

// std::sync::RwLock is correct here—the lock is never held across .await
// points; every operation is a short in-memory critical section.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::api::Report;

// ============================================================================
// StoredReport
// ============================================================================

/// A report plus the server-side time it arrived.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub report: Report,
    pub stored_at: DateTime<Utc>,
}

// ============================================================================
// ReportStore
// ============================================================================

/// Thread-safe store of task reports. Cheap to clone.
///
/// A later `put` with the same task identifier fully replaces the prior
/// entry; there is no merge.
#[derive(Clone, Default)]
pub struct ReportStore {
    entries: Arc<RwLock<HashMap<String, StoredReport>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the report's task identifier,
    /// stamping the current time as its arrival timestamp.
    pub fn put(&self, report: Report) {
        self.put_at(report, Utc::now());
    }

    /// Insert or replace with an explicit arrival timestamp.
    pub fn put_at(&self, report: Report, stored_at: DateTime<Utc>) {
        let mut entries = self.entries.write().expect("lock poisoned");
        entries.insert(report.task_id.clone(), StoredReport { report, stored_at });
    }

    /// Return a copy of the stored report, if present.
    pub fn get(&self, task_id: &str) -> Option<Report> {
        let entries = self.entries.read().expect("lock poisoned");
        entries.get(task_id).map(|e| e.report.clone())
    }

    /// Snapshot of the stored task identifiers, optionally filtered to those
    /// starting with `prefix`. Taken under a single lock acquisition; no
    /// ordering guarantee.
    pub fn list(&self, prefix: Option<&str>) -> Vec<String> {
        let entries = self.entries.read().expect("lock poisoned");
        match prefix {
            Some(p) => entries
                .keys()
                .filter(|id| id.starts_with(p))
                .cloned()
                .collect(),
            None => entries.keys().cloned().collect(),
        }
    }

    /// Current number of stored entries.
    pub fn count(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Remove the entry if present. Returns true if an entry was removed.
    pub fn remove(&self, task_id: &str) -> bool {
        let mut entries = self.entries.write().expect("lock poisoned");
        entries.remove(task_id).is_some()
    }

    /// Remove every entry whose arrival timestamp is more than `ttl` before
    /// `now`. Returns the number of entries removed.
    ///
    /// Expired identifiers are computed under a read lock first so the write
    /// lock is held only for the deletions themselves. An entry overwritten
    /// between the two sections gets a fresh arrival timestamp, so its age
    /// is re-checked before deletion.
    pub fn remove_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> usize {
        let expired: Vec<String> = {
            let entries = self.entries.read().expect("lock poisoned");
            entries
                .iter()
                .filter(|(_, e)| now - e.stored_at > ttl)
                .map(|(id, _)| id.clone())
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write().expect("lock poisoned");
        let mut removed = 0;
        for id in expired {
            let still_expired = entries.get(&id).is_some_and(|e| now - e.stored_at > ttl);
            if still_expired {
                entries.remove(&id);
                removed += 1;
            }
        }
        removed
    }
}

// ============================================================================
// Tests
// ============================================================================
