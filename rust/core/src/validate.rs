//! Advisory hand validation.
//!
//! Validation never mutates or auto-corrects a hand: it returns every
//! violated invariant so callers can record an exclusion reason and keep the
//! record for audit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hand::{Hand, Street};
use crate::money::Money;

/// A violated hand invariant. Advisory: recorded, surfaced downstream and
/// used to exclude the hand from statistics, never fixed up silently.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    #[error("contributions {contributed} do not reconcile with reported pot {reported}")]
    PotMismatch { contributed: Money, reported: Money },
    #[error("action by unknown seat: {0}")]
    UnknownActor(String),
    #[error("negative starting stack for {0}")]
    NegativeStack(String),
    #[error("{player} contributed {contributed} beyond starting stack {stack}")]
    OverCommitted {
        player: String,
        contributed: Money,
        stack: Money,
    },
    #[error("card {0} appears more than once")]
    DuplicateCard(String),
    #[error("no seats recorded")]
    NoSeats,
    #[error("actions regress from {0:?} to {1:?}")]
    StreetRegression(Street, Street),
}

/// Reconciliation slack: real histories carry sub-cent rake rounding.
pub fn pot_tolerance(pot: Money) -> Money {
    Money((pot.cents() / 100).max(2))
}

/// Checks a parsed hand for internal consistency, returning every violated
/// invariant. An empty result means the hand is valid.
pub fn validate(hand: &Hand) -> Vec<Violation> {
    let mut violations = Vec::new();

    if hand.seats.is_empty() {
        violations.push(Violation::NoSeats);
    }
    for seat in &hand.seats {
        if seat.stack < Money::ZERO {
            violations.push(Violation::NegativeStack(seat.name.clone()));
        }
    }

    let mut last = Street::Preflop;
    for action in &hand.actions {
        if action.street < last {
            violations.push(Violation::StreetRegression(last, action.street));
            break;
        }
        last = action.street;
    }

    if !hand.seats.is_empty() {
        let mut flagged: Vec<&str> = Vec::new();
        for action in &hand.actions {
            if hand.seat_of(&action.player).is_none() && !flagged.contains(&action.player.as_str())
            {
                flagged.push(&action.player);
                violations.push(Violation::UnknownActor(action.player.clone()));
            }
        }
    }

    let contributions = hand.contributions();
    for (player, contributed) in &contributions {
        if let Some(seat) = hand.seat_of(player) {
            if *contributed > seat.stack {
                violations.push(Violation::OverCommitted {
                    player: player.clone(),
                    contributed: *contributed,
                    stack: seat.stack,
                });
            }
        }
    }

    if let Some(reported) = hand.total_pot {
        let contributed: Money = contributions.values().copied().sum();
        if (contributed - reported).abs() > pot_tolerance(reported) {
            violations.push(Violation::PotMismatch {
                contributed,
                reported,
            });
        }
    }

    let mut seen = std::collections::HashSet::new();
    let all_cards = hand
        .hole_cards
        .iter()
        .copied()
        .chain(hand.board.cards())
        .chain(hand.board.second.iter().flatten().copied());
    for card in all_cards {
        if !seen.insert(card) {
            violations.push(Violation::DuplicateCard(card.token()));
            break;
        }
    }

    violations
}
