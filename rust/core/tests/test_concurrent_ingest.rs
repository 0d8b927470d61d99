use railbird_core::pipeline::{CancelToken, NoopProgress, Pipeline};
use railbird_core::stats::StatsFilter;
use std::sync::Arc;

fn stars_hand(no: u64) -> String {
    format!(
        "PokerStars Hand #{no}:  Hold'em No Limit ($0.25/$0.50 USD) - 2024/02/10 19:00:00 ET\n\
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
         Total pot $1.00 | Rake $0.00\n"
    )
}

#[test]
fn concurrent_uploads_for_one_user_serialize_cleanly() {
    let pipeline = Arc::new(Pipeline::new());

    // Two files share hands 3 and 4; hands 1-2 and 5-6 are unique to one file.
    let file_a: String = (1..=4).map(stars_hand).collect();
    let file_b: String = (3..=6).map(stars_hand).collect();

    let a = pipeline.clone();
    let b = pipeline.clone();
    let ta = std::thread::spawn(move || {
        a.ingest("u", "a.txt", file_a.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap()
    });
    let tb = std::thread::spawn(move || {
        b.ingest("u", "b.txt", file_b.as_bytes(), &NoopProgress, &CancelToken::new())
            .unwrap()
    });
    let sa = ta.join().unwrap();
    let sb = tb.join().unwrap();

    // Whichever upload wins the race, exactly 6 unique hands land and the
    // overlap resolves to duplicates.
    assert_eq!(sa.new + sb.new, 6);
    assert_eq!(sa.duplicates + sb.duplicates, 2);

    let snap = pipeline.get_statistics("u", &StatsFilter::default()).unwrap();
    assert_eq!(snap.hands, 6);
    let stored = pipeline.store().with_shard("u", |s| s.hands.len()).unwrap();
    assert_eq!(stored, 6);
}

#[test]
fn concurrent_uploads_for_different_users_do_not_interfere() {
    let pipeline = Arc::new(Pipeline::new());
    let mut handles = Vec::new();
    for user in ["a", "b", "c", "d"] {
        let p = pipeline.clone();
        let file: String = (1..=5).map(stars_hand).collect();
        handles.push(std::thread::spawn(move || {
            p.ingest(user, "x.txt", file.as_bytes(), &NoopProgress, &CancelToken::new())
                .unwrap()
        }));
    }
    for h in handles {
        assert_eq!(h.join().unwrap().new, 5);
    }
    for user in ["a", "b", "c", "d"] {
        let snap = pipeline.get_statistics(user, &StatsFilter::default()).unwrap();
        assert_eq!(snap.hands, 5);
    }
}
