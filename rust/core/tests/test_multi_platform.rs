use railbird_core::detect::detect_platform;
use railbird_core::errors::{DetectError, IngestError};
use railbird_core::hand::Platform;
use railbird_core::pipeline::{CancelToken, NoopProgress, Pipeline};
use railbird_core::stats::StatsFilter;

const GG_HAND: &str = "\
Poker Hand #HD7001: Hold'em No Limit ($0.05/$0.10) - 2024/02/10 12:00:00
Table 'NLHGold12' 6-max Seat #1 is the button
Seat 1: a1b2c3 ($10.00 in chips)
Seat 2: Hero ($10.00 in chips)
a1b2c3: posts small blind $0.05
Hero: posts big blind $0.10
*** HOLE CARDS ***
Dealt to Hero [Qs Qd]
a1b2c3: calls $0.05
Hero: checks
*** SUMMARY ***
Total pot $0.20 | Rake $0.01
";

const PARTY_HAND: &str = "\
***** Hand History for Game 7001 *****
$0.05/$0.10 USD NL Texas Hold'em - Saturday, February 10, 12:00:00 CET 2024
Table Tahoe (Real Money)
Seat 1 is the button
Total number of players : 2/6
Seat 1: villain ( $10.00 USD )
Seat 2: hero ( $10.00 USD )
villain posts small blind [$0.05 USD].
hero posts big blind [$0.10 USD].
** Dealing down cards **
Dealt to hero [ Qs Qd ]
villain folds.
Uncalled bet [$0.05 USD] returned to hero.
hero wins $0.10 USD
";

fn ingest(pipeline: &Pipeline, text: &str, name: &str) -> railbird_core::pipeline::IngestionSummary {
    pipeline
        .ingest("u", name, text.as_bytes(), &NoopProgress, &CancelToken::new())
        .unwrap()
}

#[test]
fn detection_covers_all_platforms() {
    assert_eq!(detect_platform(GG_HAND).unwrap(), Platform::GgNet);
    assert_eq!(detect_platform(PARTY_HAND).unwrap(), Platform::Party);
    assert_eq!(
        detect_platform("PokerStars Hand #1: Hold'em").unwrap(),
        Platform::Stars
    );
}

#[test]
fn unknown_format_is_rejected_with_excerpt() {
    let pipeline = Pipeline::new();
    let err = pipeline
        .ingest(
            "u",
            "notes.txt",
            b"my session notes, nothing here",
            &NoopProgress,
            &CancelToken::new(),
        )
        .unwrap_err();
    match err {
        IngestError::Detect(DetectError::UnrecognizedFormat { excerpt }) => {
            assert!(excerpt.contains("my session notes"));
        }
        other => panic!("expected detect failure, got {:?}", other),
    }
}

#[test]
fn same_hand_number_on_different_platforms_coexists() {
    let pipeline = Pipeline::new();
    // GG hand HD7001 and party game 7001 must never collide: the composite
    // key is namespaced by platform.
    let gg = ingest(&pipeline, GG_HAND, "gg.txt");
    let party = ingest(&pipeline, PARTY_HAND, "party.txt");
    assert_eq!(gg.new, 1);
    assert_eq!(party.new, 1);

    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 2);
}

#[test]
fn party_hands_flow_through_the_full_pipeline() {
    let pipeline = Pipeline::new();
    ingest(&pipeline, PARTY_HAND, "party.txt");
    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 1);
    // Big blind saw a walk: no voluntary money in.
    assert_eq!(snap.vpip_hands, 0);
    // hero posted 0.10 and collected 0.10.
    assert_eq!(snap.net, railbird_core::money::Money(0));
}

#[test]
fn mixed_platform_file_parses_as_detected_platform_only() {
    // Detection is per upload; a Stars file with GG text pasted in the middle
    // still splits on Stars headers only.
    let mixed = format!(
        "PokerStars Hand #1:  Hold'em No Limit ($0.25/$0.50 USD) - 2024/02/10 19:00:00 ET\n\
         Table 'Mira' 6-max Seat #1 is the button\n\
         Seat 1: alice ($50.00 in chips)\n\
         Seat 2: hero ($50.00 in chips)\n\
         alice: posts small blind $0.25\n\
         hero: posts big blind $0.50\n\
         *** HOLE CARDS ***\n\
         Dealt to hero [Ah Kd]\n\
         alice: calls $0.25\n\
         hero: checks\n\
         *** SUMMARY ***\n\
         Total pot $1.00 | Rake $0.00\n\n{}",
        GG_HAND
    );
    let pipeline = Pipeline::new();
    let summary = ingest(&pipeline, &mixed, "mixed.txt");
    assert_eq!(summary.total, 1);
    assert_eq!(summary.new, 1);
}
