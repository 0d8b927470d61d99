//! The structured hand-history data model.
//!
//! A [`Hand`] is the validated output of one parsed hand-history block:
//! header metadata, seats, the ordered action sequence, community cards and
//! the summary figures. Every monetary field is a fixed-point [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::cards::Card;
use crate::fingerprint;
use crate::money::Money;

/// Supported hand-history platforms.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// PokerStars-style histories ("PokerStars Hand #...")
    Stars,
    /// GG-network histories ("Poker Hand #HD...")
    GgNet,
    /// partypoker-style histories ("***** Hand History for Game ... *****")
    Party,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Stars => "stars",
            Platform::GgNet => "ggnet",
            Platform::Party => "party",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game variant named in the hand header.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GameType {
    NoLimitHoldem,
    LimitHoldem,
    PotLimitOmaha,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::NoLimitHoldem => "nlhe",
            GameType::LimitHoldem => "lhe",
            GameType::PotLimitOmaha => "plo",
        }
    }
}

/// Blind and ante structure for a hand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stakes {
    pub small_blind: Money,
    pub big_blind: Money,
    /// Per-player ante, zero when the game has none.
    #[serde(default)]
    pub ante: Money,
    pub currency: String,
}

impl Stakes {
    /// Short label used by stake filters and breakdowns, e.g. `"0.25/0.50"`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.small_blind, self.big_blind)
    }
}

/// Represents a betting street in Texas Hold'em poker.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum Street {
    /// Before flop (hole cards dealt)
    Preflop,
    /// After flop (3 community cards)
    Flop,
    /// After turn (4th community card)
    Turn,
    /// After river (5th community card)
    River,
}

/// The kind of a single recorded action.
///
/// Raise amounts are normalized to raise-to semantics at parse time, so a
/// `RaiseTo` amount is the actor's total street commitment after the raise
/// regardless of how the source platform printed it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    PostSmallBlind,
    PostBigBlind,
    PostAnte,
    Fold,
    Check,
    Call,
    Bet,
    RaiseTo,
    /// Uncalled bet returned to the actor; subtracts from their contribution.
    Return,
}

impl ActionKind {
    /// Whether the action voluntarily commits chips (posts are forced).
    pub fn is_voluntary_commit(&self) -> bool {
        matches!(self, ActionKind::Call | ActionKind::Bet | ActionKind::RaiseTo)
    }

    /// Whether the action is aggressive (bet or raise).
    pub fn is_aggressive(&self) -> bool {
        matches!(self, ActionKind::Bet | ActionKind::RaiseTo)
    }
}

/// One entry of the ordered action sequence.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub street: Street,
    pub player: String,
    pub kind: ActionKind,
    /// Zero for fold/check.
    pub amount: Money,
}

/// One occupied seat from the hand header.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Seat {
    pub number: u8,
    pub name: String,
    pub stack: Money,
}

/// Community cards, grouped by street. `second` carries the full second
/// runout of a run-it-twice hand when present.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Board {
    pub flop: Vec<Card>,
    pub turn: Option<Card>,
    pub river: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<Vec<Card>>,
}

impl Board {
    pub fn cards(&self) -> Vec<Card> {
        let mut v = self.flop.clone();
        v.extend(self.turn);
        v.extend(self.river);
        v
    }
}

/// A pot awarded to a player in the summary section.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Collection {
    pub player: String,
    pub amount: Money,
}

/// Unique per-user identifier for a stored hand: platform plus the
/// platform-assigned hand number, or a derived digest when no number exists.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(pub String);

impl CompositeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully parsed hand history record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub platform: Platform,
    /// Platform-assigned hand number, when the header carries one.
    pub hand_no: Option<String>,
    pub game: GameType,
    pub stakes: Stakes,
    pub table: String,
    pub max_seats: u8,
    pub button_seat: u8,
    /// Header timestamp, normalized to UTC when the offset is known.
    pub played_at: Option<DateTime<Utc>>,
    /// Timezone label as printed in the header ("ET", "CET", ...).
    #[serde(default)]
    pub timezone: Option<String>,
    /// The player the history was dealt to, when the file names one.
    pub hero: Option<String>,
    pub hole_cards: Vec<Card>,
    pub seats: Vec<Seat>,
    pub actions: Vec<Action>,
    pub board: Board,
    pub collections: Vec<Collection>,
    /// Total pot from the summary, rake included.
    pub total_pot: Option<Money>,
    pub rake: Option<Money>,
    /// Free-form note or metadata attached by the exporting client.
    #[serde(default)]
    pub note: Option<String>,
    /// Verbatim source text of this hand block.
    pub raw: String,
}

impl Hand {
    /// Computes the composite key identifying this hand for its owner.
    pub fn composite_key(&self) -> CompositeKey {
        match &self.hand_no {
            Some(no) => CompositeKey(format!("{}:{}", self.platform, no)),
            None => {
                let mut material = String::new();
                material.push_str(&self.table);
                material.push('|');
                if let Some(ts) = &self.played_at {
                    material.push_str(&ts.to_rfc3339());
                }
                material.push('|');
                material.push_str(&self.button_seat.to_string());
                for seat in &self.seats {
                    material.push('|');
                    material.push_str(&seat.name);
                }
                for c in &self.hole_cards {
                    material.push('|');
                    material.push_str(&c.token());
                }
                CompositeKey(format!("drv:{}", fingerprint::hex_digest(material.as_bytes())))
            }
        }
    }

    /// Reconstructs each player's total chip contribution to the pot by
    /// replaying the action sequence, honoring raise-to semantics and
    /// uncalled-bet returns.
    pub fn contributions(&self) -> BTreeMap<String, Money> {
        let mut totals: BTreeMap<String, Money> = BTreeMap::new();
        let mut street = Street::Preflop;
        let mut street_commit: BTreeMap<String, Money> = BTreeMap::new();
        for action in &self.actions {
            if action.street != street {
                street = action.street;
                street_commit.clear();
            }
            let total = totals.entry(action.player.clone()).or_default();
            let commit = street_commit.entry(action.player.clone()).or_default();
            match action.kind {
                ActionKind::PostSmallBlind
                | ActionKind::PostBigBlind
                | ActionKind::Bet
                | ActionKind::Call => {
                    *total += action.amount;
                    *commit += action.amount;
                }
                // Antes sit outside the street commitment a raise-to includes.
                ActionKind::PostAnte => {
                    *total += action.amount;
                }
                ActionKind::RaiseTo => {
                    let delta = action.amount - *commit;
                    *total += delta;
                    *commit = action.amount;
                }
                ActionKind::Return => {
                    *total -= action.amount;
                    *commit -= action.amount;
                }
                ActionKind::Fold | ActionKind::Check => {}
            }
        }
        totals
    }

    /// Net chips won or lost by `player` over this hand.
    pub fn net_result(&self, player: &str) -> Money {
        let contributed = self
            .contributions()
            .get(player)
            .copied()
            .unwrap_or(Money::ZERO);
        let collected: Money = self
            .collections
            .iter()
            .filter(|c| c.player == player)
            .map(|c| c.amount)
            .sum();
        collected - contributed
    }

    pub fn seat_of(&self, player: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.name == player)
    }
}
