//! Per-node ingestion locks.
//!
//! Ingestion of one file is a sequence of store round-trips, so two
//! concurrent calls touching the same nodes could interleave their drops,
//! inserts and relates. Each ingestion holds the lock for its file path and
//! for every node id it writes: the File, its members and its previous
//! children. Ingestions with disjoint node sets proceed independently.

use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Table of ingestion locks keyed by node id and file path
#[derive(Debug, Default)]
pub struct IngestLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of one ingestion; releases on drop
pub struct IngestGuard<'a> {
    table: &'a IngestLocks,
    keys: BTreeSet<String>,
    guards: Vec<OwnedMutexGuard<()>>,
}

fn node_key(node_id: &str) -> String {
    format!("id:{}", node_id)
}

fn path_key(file_path: &str) -> String {
    format!("path:{}", file_path)
}

impl IngestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the locks of one file path and a set of node ids.
    /// Repeated ids are locked once.
    pub async fn acquire<'n>(
        &self,
        file_path: &str,
        node_ids: impl IntoIterator<Item = &'n str>,
    ) -> IngestGuard<'_> {
        // Sorted, deduplicated keys give every ingestion the same acquisition
        // order, so overlapping lock sets cannot deadlock.
        let mut keys: BTreeSet<String> = node_ids.into_iter().map(node_key).collect();
        keys.insert(path_key(file_path));

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let lock = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }

        debug!(file_path, keys = keys.len(), "Ingestion locks acquired");
        IngestGuard {
            table: self,
            keys,
            guards,
        }
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl IngestGuard<'_> {
    /// Whether this guard holds the lock of `node_id`
    pub fn holds_node(&self, node_id: &str) -> bool {
        self.keys.contains(&node_key(node_id))
    }
}

impl Drop for IngestGuard<'_> {
    fn drop(&mut self) {
        self.guards.clear();
        for key in &self.keys {
            self.table
                .locks
                .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}
