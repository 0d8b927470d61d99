use railbird_core::pipeline::{CancelToken, NoopProgress, Pipeline};
use railbird_core::stats::StatsFilter;

fn ingest(pipeline: &Pipeline, user: &str, name: &str, text: &str) -> railbird_core::pipeline::IngestionSummary {
    pipeline
        .ingest(user, name, text.as_bytes(), &NoopProgress, &CancelToken::new())
        .unwrap()
}

const HAND_A: &str = "\
PokerStars Hand #555001:  Hold'em No Limit ($0.25/$0.50 USD) - 2024/02/10 19:00:00 ET
Table 'Mira II' 6-max Seat #1 is the button
Seat 1: alice ($50.00 in chips)
Seat 2: hero ($50.00 in chips)
alice: posts small blind $0.25
hero: posts big blind $0.50
*** HOLE CARDS ***
Dealt to hero [Ah Kd]
alice: calls $0.25
hero: checks
*** FLOP *** [2c 7d Jh]
hero: bets $0.50
alice: folds
Uncalled bet ($0.50) returned to hero
hero collected $1.00 from pot
*** SUMMARY ***
Total pot $1.00 | Rake $0.00
";

const HAND_B: &str = "\
PokerStars Hand #555002:  Hold'em No Limit ($0.25/$0.50 USD) - 2024/02/10 19:02:00 ET
Table 'Mira II' 6-max Seat #2 is the button
Seat 1: alice ($50.00 in chips)
Seat 2: hero ($50.50 in chips)
hero: posts small blind $0.25
alice: posts big blind $0.50
*** HOLE CARDS ***
Dealt to hero [9c 9d]
hero: raises $1.00 to $1.50
alice: folds
Uncalled bet ($1.00) returned to hero
hero collected $1.00 from pot
*** SUMMARY ***
Total pot $1.00 | Rake $0.00
";

#[test]
fn reingesting_the_same_file_changes_nothing() {
    let pipeline = Pipeline::new();
    let file = format!("{}\n{}", HAND_A, HAND_B);
    let first = ingest(&pipeline, "u", "sess.txt", &file);
    assert_eq!(first.new, 2);

    let before = pipeline.store().version("u").unwrap();
    let again = ingest(&pipeline, "u", "sess.txt", &file);
    assert!(again.whole_file_duplicate);
    assert_eq!(again.new, 0);
    assert_eq!(pipeline.store().version("u").unwrap(), before);
}

#[test]
fn overlapping_files_dedup_per_hand() {
    let pipeline = Pipeline::new();
    ingest(&pipeline, "u", "first.txt", HAND_A);

    // Second export covers the first hand plus one new hand.
    let overlap = format!("{}\n{}", HAND_A, HAND_B);
    let summary = ingest(&pipeline, "u", "second.txt", &overlap);
    assert!(!summary.whole_file_duplicate);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.new, 1);
    assert_eq!(summary.duplicates, 1);

    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 2);
}

#[test]
fn timestamp_fill_in_is_a_partial_merge() {
    let pipeline = Pipeline::new();
    // An export variant without the timestamp tail on the header line.
    let undated = HAND_A.replace(" - 2024/02/10 19:00:00 ET", "");
    ingest(&pipeline, "u", "undated.txt", &undated);

    let summary = ingest(&pipeline, "u", "dated.txt", HAND_A);
    assert_eq!(summary.partial_merges, 1);
    assert_eq!(summary.new, 0);

    // The dated copy replayed is now an exact duplicate per hand.
    let again = ingest(&pipeline, "u", "dated2.txt", HAND_A);
    assert_eq!(again.duplicates, 1);
    assert_eq!(again.partial_merges, 0);
}

#[test]
fn conflicting_copy_is_quarantined_not_merged() {
    let pipeline = Pipeline::new();
    ingest(&pipeline, "u", "a.txt", HAND_A);

    // Same hand number, different action sequence: someone's mangled export.
    let conflicting = HAND_A.replace("alice: calls $0.25", "alice: folds");
    let summary = ingest(&pipeline, "u", "b.txt", &conflicting);
    assert_eq!(summary.conflicts, 1);
    assert_eq!(summary.new, 0);

    // The stored hand is untouched and still counted once.
    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 1);
    let queued = pipeline
        .store()
        .with_shard("u", |s| s.conflicts.len())
        .unwrap();
    assert_eq!(queued, 1);
}

#[test]
fn truncated_hand_recovers_from_clean_reexport() {
    let pipeline = Pipeline::new();
    // Export cut off mid-hand: no summary section.
    let truncated: String = HAND_A
        .lines()
        .take_while(|l| !l.starts_with("*** SUMMARY ***"))
        .map(|l| format!("{}\n", l))
        .collect();
    let first = ingest(&pipeline, "u", "cut.txt", &truncated);
    assert_eq!(first.parse_errors, 1);
    assert_eq!(first.new, 1);

    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 0);
    assert_eq!(snap.excluded, 1);

    let retry = ingest(&pipeline, "u", "full.txt", HAND_A);
    assert_eq!(retry.partial_merges, 1);
    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 1);
    assert_eq!(snap.excluded, 0);
}

#[test]
fn garbled_multibyte_header_tail_still_ingests() {
    let pipeline = Pipeline::new();
    // Some exporters replace the timestamp tail with localized text; a
    // multi-byte character straddling the datetime width must not abort
    // the batch.
    let garbled = HAND_A.replace("2024/02/10 19:00:00 ET", "ééééééééééééé");
    let file = format!("{}\n{}", garbled, HAND_B);
    let summary = ingest(&pipeline, "u", "garbled.txt", &file);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.new, 2);
    assert_eq!(summary.parse_errors, 0);

    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 2);
}

#[test]
fn users_do_not_share_hands() {
    let pipeline = Pipeline::new();
    ingest(&pipeline, "a", "x.txt", HAND_A);
    let summary = ingest(&pipeline, "b", "x.txt", HAND_A);
    // Same file for another user is brand new to that user's shard.
    assert_eq!(summary.new, 1);
    assert!(!summary.whole_file_duplicate);
}
