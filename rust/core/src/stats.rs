//! Derived gameplay statistics.
//!
//! Per-hand metrics (VPIP, PFR, aggression components, net result, position
//! bucket) are derived from stored, validated [`Hand`] records, never from
//! raw text. Aggregation keeps running integer sums and fixed-point money;
//! conversion to percentages happens only in the presentation accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hand::{ActionKind, GameType, Hand, Street};
use crate::money::Money;
use crate::store::{UserShard, VersionToken};

/// Coarse table position of the hero for a hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PositionBucket {
    SmallBlind,
    BigBlind,
    Early,
    Middle,
    Cutoff,
    Button,
}

impl PositionBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionBucket::SmallBlind => "sb",
            PositionBucket::BigBlind => "bb",
            PositionBucket::Early => "early",
            PositionBucket::Middle => "middle",
            PositionBucket::Cutoff => "cutoff",
            PositionBucket::Button => "button",
        }
    }

    pub fn parse(s: &str) -> Option<PositionBucket> {
        match s.to_ascii_lowercase().as_str() {
            "sb" | "small_blind" => Some(PositionBucket::SmallBlind),
            "bb" | "big_blind" => Some(PositionBucket::BigBlind),
            "early" | "utg" => Some(PositionBucket::Early),
            "middle" | "mp" => Some(PositionBucket::Middle),
            "cutoff" | "co" => Some(PositionBucket::Cutoff),
            "button" | "btn" => Some(PositionBucket::Button),
            _ => None,
        }
    }
}

/// Filter over a user's hand set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Stakes label as produced by [`crate::hand::Stakes::label`], e.g. "0.25/0.50".
    pub stakes: Option<String>,
    pub game: Option<GameType>,
    pub position: Option<PositionBucket>,
}

impl StatsFilter {
    fn matches(&self, hand: &Hand) -> bool {
        if let Some(from) = self.from {
            match hand.played_at {
                Some(ts) if ts >= from => {}
                _ => return false,
            }
        }
        if let Some(to) = self.to {
            match hand.played_at {
                Some(ts) if ts <= to => {}
                _ => return false,
            }
        }
        if let Some(stakes) = &self.stakes {
            if hand.stakes.label() != *stakes {
                return false;
            }
        }
        if let Some(game) = self.game {
            if hand.game != game {
                return false;
            }
        }
        if let Some(position) = self.position {
            if hero_position(hand) != Some(position) {
                return false;
            }
        }
        true
    }
}

/// Metrics derived from a single hand for its hero. `None` when the hand
/// does not name a hero (another player's exported history, for instance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandMetrics {
    pub vpip: bool,
    pub pfr: bool,
    pub postflop_aggressive: u64,
    pub postflop_calls: u64,
    pub net: Money,
    pub position: Option<PositionBucket>,
}

/// Derives the hero's per-hand statistic contributions.
pub fn hand_metrics(hand: &Hand) -> Option<HandMetrics> {
    let hero = hand.hero.as_deref()?;
    let mut vpip = false;
    let mut pfr = false;
    let mut postflop_aggressive = 0;
    let mut postflop_calls = 0;
    for action in &hand.actions {
        if action.player != hero {
            continue;
        }
        if action.street == Street::Preflop {
            if action.kind.is_voluntary_commit() {
                vpip = true;
            }
            if action.kind == ActionKind::RaiseTo {
                pfr = true;
            }
        } else {
            if action.kind.is_aggressive() {
                postflop_aggressive += 1;
            }
            if action.kind == ActionKind::Call {
                postflop_calls += 1;
            }
        }
    }
    Some(HandMetrics {
        vpip,
        pfr,
        postflop_aggressive,
        postflop_calls,
        net: hand.net_result(hero),
        position: hero_position(hand),
    })
}

/// Buckets the hero's seat by its distance from the button.
pub fn hero_position(hand: &Hand) -> Option<PositionBucket> {
    let hero = hand.hero.as_deref()?;
    let hero_seat = hand.seat_of(hero)?.number;
    let mut numbers: Vec<u8> = hand.seats.iter().map(|s| s.number).collect();
    numbers.sort_unstable();
    let n = numbers.len();
    if n < 2 {
        return None;
    }
    let button_idx = numbers.iter().position(|&s| s == hand.button_seat)?;
    let hero_idx = numbers.iter().position(|&s| s == hero_seat)?;
    let offset = (hero_idx + n - button_idx) % n;
    Some(match offset {
        0 => PositionBucket::Button,
        1 if n == 2 => PositionBucket::BigBlind, // heads-up button posts the sb
        1 => PositionBucket::SmallBlind,
        2 => PositionBucket::BigBlind,
        o if o == n - 1 => PositionBucket::Cutoff,
        o if o <= 2 + (n - 4) / 2 => PositionBucket::Early,
        _ => PositionBucket::Middle,
    })
}

/// Per-position aggregate line in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLine {
    pub hands: u64,
    pub vpip_hands: u64,
    pub pfr_hands: u64,
    pub net: Money,
}

/// Per-stakes aggregate line in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakesLine {
    pub hands: u64,
    pub net: Money,
}

/// Read-only aggregate over a filtered, validated hand set.
///
/// Counts are raw running sums; the `*_pct` and factor accessors round only
/// at presentation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub user: String,
    pub filter: StatsFilter,
    /// Hands included in the aggregates.
    pub hands: u64,
    /// Hands matching the filter but excluded (parse error or validation
    /// violation). Always reported so exclusion is never silent.
    pub excluded: u64,
    pub vpip_hands: u64,
    pub pfr_hands: u64,
    pub aggressive_actions: u64,
    pub calls: u64,
    pub wins: u64,
    pub net: Money,
    pub by_position: BTreeMap<String, PositionLine>,
    pub by_stakes: BTreeMap<String, StakesLine>,
    pub computed_at: DateTime<Utc>,
    /// Store version this snapshot was computed from.
    pub signature: VersionToken,
}

impl StatisticsSnapshot {
    pub fn vpip_pct(&self) -> f64 {
        percentage(self.vpip_hands, self.hands)
    }

    pub fn pfr_pct(&self) -> f64 {
        percentage(self.pfr_hands, self.hands)
    }

    /// Postflop bet/raise count over call count. `None` with no calls.
    pub fn aggression_factor(&self) -> Option<f64> {
        if self.calls == 0 {
            None
        } else {
            Some(self.aggressive_actions as f64 / self.calls as f64)
        }
    }

    pub fn win_rate_pct(&self) -> f64 {
        percentage(self.wins, self.hands)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Computes a snapshot over a user's shard. Conflict-queued hands are not in
/// the shard's hand map and therefore never counted.
pub fn compute_snapshot(
    shard: &UserShard,
    user: &str,
    filter: &StatsFilter,
    signature: VersionToken,
    now: DateTime<Utc>,
) -> StatisticsSnapshot {
    let mut snap = StatisticsSnapshot {
        user: user.to_string(),
        filter: filter.clone(),
        hands: 0,
        excluded: 0,
        vpip_hands: 0,
        pfr_hands: 0,
        aggressive_actions: 0,
        calls: 0,
        wins: 0,
        net: Money::ZERO,
        by_position: BTreeMap::new(),
        by_stakes: BTreeMap::new(),
        computed_at: now,
        signature,
    };
    for stored in shard.hands.values() {
        if !filter.matches(&stored.hand) {
            continue;
        }
        if !stored.included_in_stats() {
            snap.excluded += 1;
            continue;
        }
        let Some(m) = hand_metrics(&stored.hand) else {
            snap.excluded += 1;
            continue;
        };
        snap.hands += 1;
        if m.vpip {
            snap.vpip_hands += 1;
        }
        if m.pfr {
            snap.pfr_hands += 1;
        }
        snap.aggressive_actions += m.postflop_aggressive;
        snap.calls += m.postflop_calls;
        if m.net > Money::ZERO {
            snap.wins += 1;
        }
        snap.net += m.net;
        if let Some(pos) = m.position {
            let line = snap
                .by_position
                .entry(pos.as_str().to_string())
                .or_default();
            line.hands += 1;
            if m.vpip {
                line.vpip_hands += 1;
            }
            if m.pfr {
                line.pfr_hands += 1;
            }
            line.net += m.net;
        }
        let stakes_line = snap
            .by_stakes
            .entry(stored.hand.stakes.label())
            .or_default();
        stakes_line.hands += 1;
        stakes_line.net += m.net;
    }
    snap
}
