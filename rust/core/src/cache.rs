//! Caching of computed statistics snapshots.
//!
//! Entries are keyed by user plus a hash of the filter and carry the store
//! [`VersionToken`] they were computed from. A lookup hits only when the
//! caller's current token matches the cached one, so any insert or merge for
//! the user invalidates every cached snapshot without explicit eviction. A
//! cache miss is always recoverable by recomputation, so lock poisoning here
//! degrades to a miss instead of an error.

use chrono::{DateTime, Duration, Utc};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use tracing::debug;

use crate::stats::{StatisticsSnapshot, StatsFilter};
use crate::store::{UserId, VersionToken};

struct CacheEntry {
    snapshot: StatisticsSnapshot,
    signature: VersionToken,
    expires_at: DateTime<Utc>,
}

/// Snapshot cache with signature checks and a time-to-live backstop.
pub struct AggregateCache {
    entries: RwLock<HashMap<(UserId, u64), CacheEntry>>,
    ttl: Duration,
}

impl AggregateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn filter_key(filter: &StatsFilter) -> u64 {
        let mut hasher = DefaultHasher::new();
        filter.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the cached snapshot if it was computed from the given store
    /// version and has not aged out.
    pub fn get(
        &self,
        user: &str,
        filter: &StatsFilter,
        signature: VersionToken,
        now: DateTime<Utc>,
    ) -> Option<StatisticsSnapshot> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&(user.to_string(), Self::filter_key(filter)))?;
        if entry.signature != signature {
            debug!(user, "cached snapshot is stale, store version moved");
            return None;
        }
        if entry.expires_at <= now {
            return None;
        }
        Some(entry.snapshot.clone())
    }

    pub fn put(&self, user: &str, filter: &StatsFilter, snapshot: StatisticsSnapshot, now: DateTime<Utc>) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        entries.retain(|_, e| e.expires_at > now);
        let signature = snapshot.signature;
        entries.insert(
            (user.to_string(), Self::filter_key(filter)),
            CacheEntry {
                snapshot,
                signature,
                expires_at: now + self.ttl,
            },
        );
    }
}

impl Default for AggregateCache {
    fn default() -> Self {
        Self::new(Duration::minutes(10))
    }
}
