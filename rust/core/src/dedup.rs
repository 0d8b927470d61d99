//! Deduplication of incoming hands against a user's stored set.
//!
//! Hands are classified by composite key plus an identity digest over their
//! identifying fields: a key hit with the same digest is the same logical
//! hand (exact duplicate, or a partial duplicate when non-identifying
//! metadata can be merged in); a key hit with a different digest is a
//! conflict that is queued for explicit resolution, never auto-merged.
//! Applying the same input twice leaves the shard byte-identical.
//!
//! Of the mergeable fields, `note` is never produced by the hand-history
//! grammars; its fill-in covers records created or annotated directly
//! through the store API.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::fingerprint::identity_digest;
use crate::hand::CompositeKey;
use crate::parse::ParsedHand;
use crate::store::{ConflictRecord, MergeAudit, StoredHand, UploadRecord, UserShard};
use crate::validate::Violation;

/// Outcome for one candidate hand, with the composite key of the canonical
/// stored record it was resolved against.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DuplicateDecision {
    New { key: CompositeKey },
    ExactDuplicate { canonical: CompositeKey },
    PartialMerged { canonical: CompositeKey, fields: Vec<String> },
    Conflicting { canonical: CompositeKey },
}

/// File-level fast path: an upload whose fingerprint was already recorded
/// for this user is a whole-file duplicate and needs no re-parse.
pub fn is_known_upload(shard: &UserShard, fingerprint: &str) -> Option<u64> {
    shard.uploads.get(fingerprint).map(|u| u.hands)
}

pub fn record_upload(
    shard: &mut UserShard,
    fingerprint: &str,
    filename: &str,
    hands: u64,
    now: DateTime<Utc>,
) {
    shard
        .uploads
        .entry(fingerprint.to_string())
        .or_insert(UploadRecord {
            filename: filename.to_string(),
            uploaded_at: now,
            hands,
        });
}

/// Resolves one parsed hand against the shard and applies the outcome.
///
/// Must be called with the user's shard lock held (the store's `with_shard`
/// does this); the single-writer discipline is what makes the version
/// counter and merge audit trail race-free.
pub fn apply_hand(
    shard: &mut UserShard,
    parsed: ParsedHand,
    violations: Vec<Violation>,
    upload_fingerprint: &str,
    now: DateTime<Utc>,
) -> DuplicateDecision {
    let key = parsed.hand.composite_key();
    let identity = identity_digest(&parsed.hand);

    let Some(existing) = shard.hands.get_mut(&key) else {
        shard.hands.insert(
            key.clone(),
            StoredHand {
                hand: parsed.hand,
                identity,
                parse_error: parsed.error,
                violations,
                source_fingerprint: upload_fingerprint.to_string(),
                first_seen: now,
                merges: Vec::new(),
            },
        );
        shard.bump_version();
        return DuplicateDecision::New { key };
    };

    if existing.identity != identity {
        // A clean re-export supersedes a record kept only because its first
        // copy was truncated mid-block; the truncated copy's digest can never
        // match the complete one.
        if existing.parse_error.is_some() && parsed.error.is_none() {
            existing.hand = parsed.hand;
            existing.identity = identity;
            existing.parse_error = None;
            existing.violations = violations;
            let fields = vec!["parse_recovery".to_string()];
            existing.merges.push(MergeAudit {
                merged_at: now,
                upload_fingerprint: upload_fingerprint.to_string(),
                fields: fields.clone(),
            });
            shard.bump_version();
            return DuplicateDecision::PartialMerged {
                canonical: key,
                fields,
            };
        }
        // The reverse: a truncated copy of an already-complete hand adds
        // nothing and is discarded.
        if parsed.error.is_some() && existing.parse_error.is_none() {
            debug!(%key, "truncated duplicate of a complete hand discarded");
            return DuplicateDecision::ExactDuplicate { canonical: key };
        }
        warn!(%key, "conflicting duplicate: same key, different identifying fields");
        let already_queued = shard
            .conflicts
            .iter()
            .any(|c| c.key == key && c.incoming_identity == identity);
        if !already_queued {
            shard.conflicts.push(ConflictRecord {
                key: key.clone(),
                incoming: parsed.hand,
                incoming_identity: identity,
                upload_fingerprint: upload_fingerprint.to_string(),
                detected_at: now,
            });
        }
        return DuplicateDecision::Conflicting { canonical: key };
    }

    // Same identity: merge whatever non-identifying fields the incoming copy
    // has and the canonical record lacks. Field fill-in only, so replaying
    // the same upload cannot drift the record.
    let mut fields = Vec::new();
    if existing.hand.note.is_none() && parsed.hand.note.is_some() {
        existing.hand.note = parsed.hand.note.clone();
        fields.push("note".to_string());
    }
    if existing.hand.timezone.is_none() && parsed.hand.timezone.is_some() {
        existing.hand.timezone = parsed.hand.timezone.clone();
        fields.push("timezone".to_string());
    }
    if existing.hand.played_at.is_none() && parsed.hand.played_at.is_some() {
        existing.hand.played_at = parsed.hand.played_at;
        fields.push("played_at".to_string());
    }
    if existing.hand.hero.is_none() && parsed.hand.hero.is_some() {
        // Hole cards are identity-covered, so equal identity means equal
        // hole cards; only the hero name itself can be missing here.
        existing.hand.hero = parsed.hand.hero.clone();
        fields.push("hero".to_string());
    }
    // A clean re-export supersedes a record kept only because its first
    // copy was truncated mid-block.
    if existing.parse_error.is_some() && parsed.error.is_none() {
        existing.hand = parsed.hand;
        existing.parse_error = None;
        existing.violations = violations;
        fields.push("parse_recovery".to_string());
    }

    if fields.is_empty() {
        debug!(%key, "exact duplicate discarded");
        return DuplicateDecision::ExactDuplicate { canonical: key };
    }
    existing.merges.push(MergeAudit {
        merged_at: now,
        upload_fingerprint: upload_fingerprint.to_string(),
        fields: fields.clone(),
    });
    shard.bump_version();
    DuplicateDecision::PartialMerged {
        canonical: key,
        fields,
    }
}
