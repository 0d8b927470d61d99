//! The ingestion pipeline: upload bytes in, per-hand decisions out.
//!
//! Parsing and validation are pure and run in parallel across hand blocks;
//! all shard mutation happens afterwards in upload order under the user's
//! shard lock, which keeps concurrent uploads for the same user serialized
//! and their outcomes deterministic.

use chrono::Utc;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::cache::AggregateCache;
use crate::dedup::{self, DuplicateDecision};
use crate::detect::detect_platform;
use crate::errors::{IngestError, StoreError};
use crate::parse::{parse_block, hand_blocks, HandStream, ParsedHand};
use crate::stats::{compute_snapshot, StatisticsSnapshot, StatsFilter};
use crate::store::HandStore;
use crate::validate::{validate, Violation};

/// Per-upload outcome tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub total: u64,
    pub new: u64,
    pub duplicates: u64,
    pub partial_merges: u64,
    pub conflicts: u64,
    pub parse_errors: u64,
    /// Set when the upload's content fingerprint was already recorded and
    /// nothing was re-parsed.
    pub whole_file_duplicate: bool,
    /// Hands applied before a cancellation took effect, if any.
    pub cancelled_after: Option<u64>,
}

/// Receives per-hand progress while an upload is being applied.
pub trait ProgressSink: Send + Sync {
    fn on_hand(&self, applied: u64, total: u64);
}

/// Sink for callers that do not track progress.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_hand(&self, _applied: u64, _total: u64) {}
}

/// Cooperative cancellation flag checked at hand boundaries. Hands already
/// applied stay applied; cancellation never leaves a half-written hand.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ingestion and statistics front door over a [`HandStore`] and its
/// [`AggregateCache`].
#[derive(Default)]
pub struct Pipeline {
    store: HandStore,
    cache: AggregateCache,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: AggregateCache) -> Self {
        Self {
            store: HandStore::new(),
            cache,
        }
    }

    pub fn store(&self) -> &HandStore {
        &self.store
    }

    /// Ingests one upload for one user.
    ///
    /// The whole file is fingerprinted and detected first; a previously seen
    /// fingerprint short-circuits without re-parsing. Otherwise every hand
    /// block is parsed and validated in parallel, then applied to the user's
    /// shard in file order.
    pub fn ingest(
        &self,
        user: &str,
        filename: &str,
        bytes: &[u8],
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<IngestionSummary, IngestError> {
        let text = std::str::from_utf8(bytes).map_err(|_| IngestError::NotText)?;
        let fingerprint = crate::fingerprint::upload_fingerprint(bytes);
        let platform = detect_platform(text)?;

        let known = self
            .store
            .with_shard(user, |shard| dedup::is_known_upload(shard, &fingerprint))?;
        if let Some(hands) = known {
            info!(user, filename, "whole-file duplicate, skipping re-parse");
            return Ok(IngestionSummary {
                total: hands,
                duplicates: hands,
                whole_file_duplicate: true,
                ..Default::default()
            });
        }

        // Below this many hands the rayon dispatch costs more than the parse;
        // small uploads take the sequential stream instead.
        const PARALLEL_THRESHOLD: usize = 32;

        fn screen(parsed: ParsedHand) -> (ParsedHand, Vec<Violation>) {
            let violations = if parsed.is_clean() {
                validate(&parsed.hand)
            } else {
                Vec::new()
            };
            (parsed, violations)
        }

        let blocks = hand_blocks(text, platform);
        let parsed: Vec<(ParsedHand, Vec<Violation>)> = if blocks.len() < PARALLEL_THRESHOLD {
            HandStream::new(text, platform).map(screen).collect()
        } else {
            blocks
                .par_iter()
                .map(|block| screen(parse_block(platform, block)))
                .collect()
        };

        let mut summary = IngestionSummary {
            total: parsed.len() as u64,
            ..Default::default()
        };
        let now = Utc::now();
        let total = parsed.len() as u64;

        self.store.with_shard(user, |shard| {
            let mut applied = 0u64;
            for (parsed, violations) in parsed {
                if cancel.is_cancelled() {
                    summary.cancelled_after = Some(applied);
                    break;
                }
                if parsed.error.is_some() {
                    summary.parse_errors += 1;
                }
                match dedup::apply_hand(shard, parsed, violations, &fingerprint, now) {
                    DuplicateDecision::New { .. } => summary.new += 1,
                    DuplicateDecision::ExactDuplicate { .. } => summary.duplicates += 1,
                    DuplicateDecision::PartialMerged { .. } => summary.partial_merges += 1,
                    DuplicateDecision::Conflicting { .. } => summary.conflicts += 1,
                }
                applied += 1;
                progress.on_hand(applied, total);
            }
            // A cancelled upload is not recorded: re-ingesting it must take
            // the per-hand path, where already-applied hands dedup cleanly.
            if summary.cancelled_after.is_none() {
                dedup::record_upload(shard, &fingerprint, filename, total, now);
            }
        })?;

        info!(
            user,
            filename,
            total = summary.total,
            new = summary.new,
            duplicates = summary.duplicates,
            conflicts = summary.conflicts,
            "upload ingested"
        );
        Ok(summary)
    }

    /// Returns statistics for the user under `filter`, recomputing only when
    /// the user's store version moved since the cached snapshot.
    pub fn get_statistics(
        &self,
        user: &str,
        filter: &StatsFilter,
    ) -> Result<StatisticsSnapshot, StoreError> {
        let now = Utc::now();
        let signature = self.store.version(user)?;
        if let Some(hit) = self.cache.get(user, filter, signature, now) {
            return Ok(hit);
        }
        let snapshot = self
            .store
            .with_shard(user, |shard| compute_snapshot(shard, user, filter, signature, now))?;
        self.cache.put(user, filter, snapshot.clone(), now);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPLOAD: &str = "\
PokerStars Hand #100: Hold'em No Limit ($0.25/$0.50 USD) - 2024/03/01 20:00:00 ET
Table 'Aludra' 6-max Seat #1 is the button
Seat 1: alice ($50.00 in chips)
Seat 2: hero ($50.00 in chips)
alice: posts small blind $0.25
hero: posts big blind $0.50
*** HOLE CARDS ***
Dealt to hero [Ah Kd]
alice: calls $0.25
hero: checks
*** SUMMARY ***
Total pot $1.00 | Rake $0.00

PokerStars Hand #101: Hold'em No Limit ($0.25/$0.50 USD) - 2024/03/01 20:01:00 ET
Table 'Aludra' 6-max Seat #2 is the button
Seat 1: alice ($50.00 in chips)
Seat 2: hero ($50.00 in chips)
hero: posts small blind $0.25
alice: posts big blind $0.50
*** HOLE CARDS ***
Dealt to hero [2c 2d]
hero: folds
Uncalled bet ($0.25) returned to alice
alice collected $0.50 from pot
*** SUMMARY ***
Total pot $0.50 | Rake $0.00
";

    #[test]
    fn test_ingest_counts_new_hands() {
        let pipeline = Pipeline::new();
        let summary = pipeline
            .ingest("u", "a.txt", UPLOAD.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.new, 2);
        assert_eq!(summary.duplicates, 0);
        assert!(!summary.whole_file_duplicate);
    }

    #[test]
    fn test_reingest_takes_whole_file_fast_path() {
        let pipeline = Pipeline::new();
        pipeline
            .ingest("u", "a.txt", UPLOAD.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        let again = pipeline
            .ingest("u", "a.txt", UPLOAD.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        assert!(again.whole_file_duplicate);
        assert_eq!(again.duplicates, 2);
        assert_eq!(again.new, 0);
    }

    #[test]
    fn test_non_utf8_is_rejected() {
        let pipeline = Pipeline::new();
        let err = pipeline
            .ingest("u", "a.bin", &[0xff, 0xfe, 0x00], &NoopProgress, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, IngestError::NotText));
    }

    #[test]
    fn test_cancelled_upload_is_not_recorded_and_resumes() {
        struct CancelAfterFirst(CancelToken);
        impl ProgressSink for CancelAfterFirst {
            fn on_hand(&self, applied: u64, _total: u64) {
                if applied == 1 {
                    self.0.cancel();
                }
            }
        }
        let pipeline = Pipeline::new();
        let cancel = CancelToken::new();
        let summary = pipeline
            .ingest(
                "u",
                "a.txt",
                UPLOAD.as_bytes(),
                &CancelAfterFirst(cancel.clone()),
                &cancel,
            )
            .unwrap();
        assert_eq!(summary.cancelled_after, Some(1));
        assert_eq!(summary.new, 1);

        // The retry is not a whole-file duplicate; the first hand dedups and
        // the second lands.
        let retry = pipeline
            .ingest("u", "a.txt", UPLOAD.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        assert!(!retry.whole_file_duplicate);
        assert_eq!(retry.new, 1);
        assert_eq!(retry.duplicates, 1);
    }

    #[test]
    fn test_statistics_reflect_ingested_hands() {
        let pipeline = Pipeline::new();
        pipeline
            .ingest("u", "a.txt", UPLOAD.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
        assert_eq!(snap.hands, 2);
        // Hand #100: big blind checks (no vpip). Hand #101: small blind folds.
        assert_eq!(snap.vpip_hands, 0);

        // Cached snapshot is reused while the store version is unchanged.
        let again = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
        assert_eq!(again.computed_at, snap.computed_at);
    }

    #[test]
    fn test_statistics_recompute_after_new_upload() {
        let pipeline = Pipeline::new();
        pipeline
            .ingest("u", "a.txt", UPLOAD.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        let before = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();

        let extra = UPLOAD.replace("#100", "#200").replace("#101", "#201");
        pipeline
            .ingest("u", "b.txt", extra.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap();
        let after = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
        assert_eq!(after.hands, 4);
        assert_ne!(after.signature, before.signature);
    }
}
