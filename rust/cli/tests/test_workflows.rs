//! End-to-end workflow tests driving the CLI through `run`.
//!
//! Each test works in its own temporary store directory and passes --user and
//! --store explicitly, so no environment configuration is involved.

use std::path::Path;

fn stars_hand(no: u64, hero_action: &str) -> String {
    format!(
        "PokerStars Hand #{no}:  Hold'em No Limit ($0.25/$0.50 USD) - 2024/03/01 20:00:00 ET\n\
         Table 'Lyra' 6-max Seat #1 is the button\n\
         Seat 1: alice ($50.00 in chips)\n\
         Seat 2: hero ($50.00 in chips)\n\
         alice: posts small blind $0.25\n\
         hero: posts big blind $0.50\n\
         *** HOLE CARDS ***\n\
         Dealt to hero [Ah Kd]\n\
         alice: calls $0.25\n\
         hero: {hero_action}\n\
         *** SUMMARY ***\n\
         Total pot $1.00 | Rake $0.00\n"
    )
}

fn run_ok(args: Vec<&str>) -> String {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = railbird_cli::run(args.clone(), &mut out, &mut err);
    assert_eq!(
        code,
        0,
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&err)
    );
    String::from_utf8(out).unwrap()
}

fn write_file(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_ingest_then_stats_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let input = dir.path().join("session.txt");
    write_file(&input, &(stars_hand(1, "checks") + "\n" + &stars_hand(2, "checks")));

    let output = run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);
    assert!(output.contains("2 hands, 2 new"));

    let report = run_ok(vec![
        "railbird", "stats", "--user", "alice", "--store", store,
    ]);
    assert!(report.contains("hands: 2 (0 excluded)"));
    assert!(report.contains("user: alice"));
}

#[test]
fn test_reingest_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let input = dir.path().join("session.txt");
    write_file(&input, &stars_hand(1, "checks"));

    run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);
    let second = run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);
    assert!(second.contains("already ingested"));

    let report = run_ok(vec![
        "railbird", "stats", "--user", "alice", "--store", store,
    ]);
    assert!(report.contains("hands: 1"));
}

#[test]
fn test_compressed_inputs_are_ingested() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let input = dir.path().join("session.txt.zst");
    let compressed = zstd::bulk::compress(stars_hand(9, "checks").as_bytes(), 0).unwrap();
    std::fs::write(&input, compressed).unwrap();

    let output = run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);
    assert!(output.contains("1 hands, 1 new"));
}

#[test]
fn test_overlapping_files_dedup_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    write_file(&first, &(stars_hand(1, "checks") + "\n" + &stars_hand(2, "checks")));
    write_file(&second, &(stars_hand(2, "checks") + "\n" + &stars_hand(3, "checks")));

    run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        first.to_str().unwrap(),
    ]);
    let output = run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        second.to_str().unwrap(),
    ]);
    assert!(output.contains("2 hands, 1 new, 1 duplicates"));

    let report = run_ok(vec![
        "railbird", "stats", "--user", "alice", "--store", store,
    ]);
    assert!(report.contains("hands: 3"));
}

#[test]
fn test_users_have_isolated_stores() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let input = dir.path().join("session.txt");
    write_file(&input, &stars_hand(1, "checks"));

    run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);
    run_ok(vec![
        "railbird", "ingest", "--user", "bob", "--store", store,
        input.to_str().unwrap(),
    ]);

    let alice = run_ok(vec![
        "railbird", "stats", "--user", "alice", "--store", store,
    ]);
    let bob = run_ok(vec![
        "railbird", "stats", "--user", "bob", "--store", store,
    ]);
    assert!(alice.contains("hands: 1"));
    assert!(bob.contains("hands: 1"));
}

#[test]
fn test_ingest_then_export_csv_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let input = dir.path().join("session.txt");
    write_file(&input, &stars_hand(1, "checks"));

    run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);

    let csv_path = dir.path().join("hands.csv");
    run_ok(vec![
        "railbird", "export", "--user", "alice", "--store", store,
        "--format", "csv", "--output", csv_path.to_str().unwrap(),
    ]);
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.lines().count() >= 2, "header plus one row expected");
    assert!(csv.contains("stars:1"));

    let json_path = dir.path().join("hands.json");
    run_ok(vec![
        "railbird", "export", "--user", "alice", "--store", store,
        "--format", "json", "--output", json_path.to_str().unwrap(),
    ]);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[test]
fn test_stats_json_snapshot_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().to_str().unwrap();
    let input = dir.path().join("session.txt");
    write_file(&input, &stars_hand(1, "checks"));

    run_ok(vec![
        "railbird", "ingest", "--user", "alice", "--store", store,
        input.to_str().unwrap(),
    ]);
    let raw = run_ok(vec![
        "railbird", "stats", "--user", "alice", "--store", store, "--json",
    ]);
    let snap: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(snap["user"], "alice");
    assert_eq!(snap["hands"], 1);
    assert!(snap["by_stakes"].is_object());
}
