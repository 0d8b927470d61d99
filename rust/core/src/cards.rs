use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// Represents one of the four suits in a standard 52-card deck.
/// Used as a component of [`Card`] to fully define a playing card.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Suit {
    /// Clubs suit (♣)
    Clubs,
    /// Diamonds suit (♦)
    Diamonds,
    /// Hearts suit (♥)
    Hearts,
    /// Spades suit (♠)
    Spades,
}

/// Represents the rank (face value) of a playing card from Two through Ace.
/// Numeric values are assigned for comparison purposes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Rank {
    /// Rank 2
    Two = 2,
    /// Rank 3
    Three,
    /// Rank 4
    Four,
    /// Rank 5
    Five,
    /// Rank 6
    Six,
    /// Rank 7
    Seven,
    /// Rank 8
    Eight,
    /// Rank 9
    Nine,
    /// Rank 10
    Ten,
    /// Jack (11)
    Jack,
    /// Queen (12)
    Queen,
    /// King (13)
    King,
    /// Ace (14)
    Ace,
}

/// A single playing card with a suit and rank.
///
/// Hand histories write cards as two-character tokens ("Ah", "Td", "9c");
/// [`Card::parse`] accepts exactly that form.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Card {
    /// The suit of the card (Clubs, Diamonds, Hearts, or Spades)
    pub suit: Suit,
    /// The rank of the card (Two through Ace)
    pub rank: Rank,
}

impl Card {
    /// Parses a two-character hand-history token such as `"Ah"` or `"Td"`.
    pub fn parse(token: &str) -> Result<Card, ParseError> {
        let mut chars = token.chars();
        let (Some(r), Some(s), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseError::BadCard(token.to_string()));
        };
        let rank = match r.to_ascii_uppercase() {
            '2' => Rank::Two,
            '3' => Rank::Three,
            '4' => Rank::Four,
            '5' => Rank::Five,
            '6' => Rank::Six,
            '7' => Rank::Seven,
            '8' => Rank::Eight,
            '9' => Rank::Nine,
            'T' => Rank::Ten,
            'J' => Rank::Jack,
            'Q' => Rank::Queen,
            'K' => Rank::King,
            'A' => Rank::Ace,
            _ => return Err(ParseError::BadCard(token.to_string())),
        };
        let suit = match s.to_ascii_lowercase() {
            'c' => Suit::Clubs,
            'd' => Suit::Diamonds,
            'h' => Suit::Hearts,
            's' => Suit::Spades,
            _ => return Err(ParseError::BadCard(token.to_string())),
        };
        Ok(Card { suit, rank })
    }

    /// Renders the card back into its two-character token form.
    pub fn token(&self) -> String {
        let r = match self.rank {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        };
        let s = match self.suit {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        };
        format!("{}{}", r, s)
    }
}

/// Parses a whitespace-separated card list as it appears between brackets
/// in a hand history, e.g. `"2c 7d Jh"`.
pub fn parse_card_list(s: &str) -> Result<Vec<Card>, ParseError> {
    s.split_whitespace().map(Card::parse).collect()
}
