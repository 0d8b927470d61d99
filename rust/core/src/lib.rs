//! # railbird-core: Hand History Ingestion and Statistics Core
//!
//! Parses poker hand history exports from multiple platforms into a single
//! normalized model, deduplicates overlapping uploads, validates hands
//! against pot and action invariants, and computes gameplay statistics over
//! the surviving set. All money is fixed-point cents; floats appear only at
//! the presentation edge.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and token parsing
//! - [`money`] - Fixed-point monetary amounts in integer cents
//! - [`hand`] - The normalized hand model: seats, actions, boards, stakes
//! - [`detect`] - Platform detection from upload text
//! - [`parse`] - Per-platform hand history grammars and the hand stream
//! - [`validate`] - Advisory invariant checks over parsed hands
//! - [`fingerprint`] - Upload and hand-identity digests
//! - [`store`] - Per-user hand shards with version tokens
//! - [`dedup`] - Exact/partial/conflict duplicate resolution
//! - [`stats`] - Per-hand metrics and filtered aggregate snapshots
//! - [`cache`] - Version-signed snapshot caching
//! - [`pipeline`] - The ingestion and statistics front door
//! - [`errors`] - Error types shared across the crate
//!
//! ## Quick Start
//!
//! ```rust
//! use railbird_core::pipeline::{CancelToken, NoopProgress, Pipeline};
//! use railbird_core::stats::StatsFilter;
//!
//! let history = "\
//! PokerStars Hand #1: Hold'em No Limit ($0.25/$0.50 USD) - 2024/03/01 20:00:00 ET
//! Table 'Aludra' 6-max Seat #1 is the button
//! Seat 1: alice ($50.00 in chips)
//! Seat 2: hero ($50.00 in chips)
//! alice: posts small blind $0.25
//! hero: posts big blind $0.50
//! *** HOLE CARDS ***
//! Dealt to hero [Ah Kd]
//! alice: calls $0.25
//! hero: checks
//! *** SUMMARY ***
//! Total pot $1.00 | Rake $0.00
//! ";
//!
//! let pipeline = Pipeline::new();
//! let summary = pipeline
//!     .ingest("user-1", "session.txt", history.as_bytes(), &NoopProgress, &CancelToken::new())
//!     .unwrap();
//! assert_eq!(summary.new, 1);
//!
//! let stats = pipeline.get_statistics("user-1", &StatsFilter::default()).unwrap();
//! assert_eq!(stats.hands, 1);
//! ```

pub mod cache;
pub mod cards;
pub mod dedup;
pub mod detect;
pub mod errors;
pub mod fingerprint;
pub mod hand;
pub mod money;
pub mod parse;
pub mod pipeline;
pub mod stats;
pub mod store;
pub mod validate;
