//! The hand store: per-user shards behind individual locks.
//!
//! Writes for one user are serialized by that user's shard mutex (single
//! writer per user); uploads for different users never contend on a shared
//! lock. Each shard carries a monotonic version counter bumped on every
//! successful insert or merge, exposed as an opaque [`VersionToken`] that
//! statistics caching uses as its dependency signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::errors::{ParseError, StoreError};
use crate::hand::{CompositeKey, Hand};
use crate::validate::Violation;

pub type UserId = String;

/// Opaque per-user store version. Monotonic; two equal tokens guarantee the
/// user's hand set has not changed between observations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(pub(crate) u64);

/// Audit record for one partial-duplicate merge applied to a stored hand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MergeAudit {
    pub merged_at: DateTime<Utc>,
    pub upload_fingerprint: String,
    /// Names of the fields filled in by the merge.
    pub fields: Vec<String>,
}

/// A hand as persisted, together with everything needed for audit and for
/// statistics exclusion accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredHand {
    pub hand: Hand,
    /// Digest over the hand's identifying fields.
    pub identity: String,
    pub parse_error: Option<ParseError>,
    pub violations: Vec<Violation>,
    /// Fingerprint of the upload that first carried this hand.
    pub source_fingerprint: String,
    pub first_seen: DateTime<Utc>,
    pub merges: Vec<MergeAudit>,
}

impl StoredHand {
    /// Whether the hand participates in statistics. Parse errors and
    /// validation violations exclude it; the record itself is retained.
    pub fn included_in_stats(&self) -> bool {
        self.parse_error.is_none() && self.violations.is_empty()
    }

    pub fn exclusion_reason(&self) -> Option<String> {
        if let Some(e) = &self.parse_error {
            return Some(format!("parse error: {}", e));
        }
        if let Some(v) = self.violations.first() {
            return Some(format!("validation: {}", v));
        }
        None
    }
}

/// An incoming hand that collided with a stored hand on composite key while
/// disagreeing on identifying fields. Never auto-merged; excluded from
/// statistics until explicitly resolved by the upload coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub key: CompositeKey,
    pub incoming: Hand,
    pub incoming_identity: String,
    pub upload_fingerprint: String,
    pub detected_at: DateTime<Utc>,
}

/// One upload seen for a user, keyed by content fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub hands: u64,
}

/// Everything stored for one user. Serializable as a whole so callers can
/// persist and restore shards on whatever medium they choose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserShard {
    pub hands: BTreeMap<CompositeKey, StoredHand>,
    pub conflicts: Vec<ConflictRecord>,
    pub uploads: BTreeMap<String, UploadRecord>,
    version: u64,
}

impl UserShard {
    pub fn version(&self) -> VersionToken {
        VersionToken(self.version)
    }

    /// Bumped by the deduplication engine on every successful insert/merge.
    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// In-memory hand store sharded per user.
#[derive(Default)]
pub struct HandStore {
    shards: Mutex<HashMap<UserId, Arc<Mutex<UserShard>>>>,
}

impl HandStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, user: &str) -> Result<Arc<Mutex<UserShard>>, StoreError> {
        let mut map = self
            .shards
            .lock()
            .map_err(|_| StoreError::Unavailable("shard index lock poisoned".into()))?;
        Ok(map
            .entry(user.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserShard::default())))
            .clone())
    }

    /// Runs `f` with exclusive access to the user's shard. All dedup writes
    /// go through here, which is what serializes concurrent uploads for the
    /// same user.
    pub fn with_shard<R>(
        &self,
        user: &str,
        f: impl FnOnce(&mut UserShard) -> R,
    ) -> Result<R, StoreError> {
        let shard = self.shard(user)?;
        let mut guard = shard
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("shard lock poisoned for {}", user)))?;
        Ok(f(&mut guard))
    }

    pub fn version(&self, user: &str) -> Result<VersionToken, StoreError> {
        self.with_shard(user, |s| s.version())
    }

    /// Clones the user's shard for persistence.
    pub fn snapshot_user(&self, user: &str) -> Result<UserShard, StoreError> {
        self.with_shard(user, |s| s.clone())
    }

    /// Replaces the user's shard from a persisted snapshot.
    pub fn restore_user(&self, user: &str, shard: UserShard) -> Result<(), StoreError> {
        self.with_shard(user, |s| *s = shard)
    }
}
