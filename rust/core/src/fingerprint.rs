//! Content fingerprints for whole-file and per-hand duplicate detection.

use sha2::{Digest, Sha256};

use crate::hand::Hand;

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    let mut s = String::with_capacity(out.len() * 2);
    for b in out {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Fingerprint of a raw upload. Any single-byte mutation of the upload
/// changes this value.
pub fn upload_fingerprint(bytes: &[u8]) -> String {
    hex_digest(bytes)
}

/// Digest over a hand's identifying fields only.
///
/// Two hands with the same composite key and the same identity digest are
/// the same logical hand; any remaining differences are non-identifying
/// metadata eligible for merging. A differing digest under the same key is
/// a conflict requiring explicit resolution.
pub fn identity_digest(hand: &Hand) -> String {
    let mut m = String::new();
    let mut push = |part: &str| {
        m.push_str(part);
        m.push('\x1f');
    };
    push(hand.platform.as_str());
    push(hand.hand_no.as_deref().unwrap_or(""));
    push(hand.game.as_str());
    push(&hand.stakes.small_blind.cents().to_string());
    push(&hand.stakes.big_blind.cents().to_string());
    push(&hand.stakes.ante.cents().to_string());
    push(&hand.stakes.currency);
    push(&hand.table);
    push(&hand.max_seats.to_string());
    push(&hand.button_seat.to_string());
    for seat in &hand.seats {
        push(&format!("{}:{}:{}", seat.number, seat.name, seat.stack.cents()));
    }
    for c in &hand.hole_cards {
        push(&c.token());
    }
    for c in hand.board.cards() {
        push(&c.token());
    }
    if let Some(second) = &hand.board.second {
        for c in second {
            push(&c.token());
        }
    }
    for a in &hand.actions {
        push(&format!(
            "{:?}:{}:{:?}:{}",
            a.street,
            a.player,
            a.kind,
            a.amount.cents()
        ));
    }
    for c in &hand.collections {
        push(&format!("{}:{}", c.player, c.amount.cents()));
    }
    push(&hand.total_pot.map(|m| m.cents()).unwrap_or(-1).to_string());
    push(&hand.rake.map(|m| m.cents()).unwrap_or(-1).to_string());
    hex_digest(m.as_bytes())
}
