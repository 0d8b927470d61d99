//! Per-platform hand-history grammars.
//!
//! Each platform gets its own pure parse function over one hand block; adding
//! a platform is a closed, independently testable unit. [`HandStream`] walks
//! an upload lazily, yielding one [`ParsedHand`] per hand block. A hand that
//! fails structural parsing still yields a best-effort partial [`Hand`] with
//! the error attached, so nothing is silently dropped.

mod ggnet;
mod party;
mod stars;

use crate::errors::ParseError;
use crate::hand::{Hand, Platform};

/// A parse result for one hand block: always a Hand, plus the parse error
/// when the block was structurally broken. Hands carrying an error are
/// retained for audit and excluded from statistics.
#[derive(Debug, Clone)]
pub struct ParsedHand {
    pub hand: Hand,
    pub error: Option<ParseError>,
}

impl ParsedHand {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

/// Parses a single hand block with the grammar for `platform`.
pub fn parse_block(platform: Platform, block: &str) -> ParsedHand {
    match platform {
        Platform::Stars => stars::parse_one(block),
        Platform::GgNet => ggnet::parse_one(block),
        Platform::Party => party::parse_one(block),
    }
}

/// Splits an upload into per-hand text blocks at the platform's header marker.
pub fn hand_blocks(text: &str, platform: Platform) -> Vec<&str> {
    let marker = header_marker(platform);
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with(marker) {
            starts.push(offset);
        }
        offset += line.len();
    }
    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = text[start..end].trim_end();
        if !block.is_empty() {
            blocks.push(block);
        }
    }
    blocks
}

fn header_marker(platform: Platform) -> &'static str {
    match platform {
        Platform::Stars => "PokerStars ",
        Platform::GgNet => "Poker Hand #",
        Platform::Party => "***** Hand History for Game ",
    }
}

/// Lazy, finite, non-restartable stream of parsed hands over one immutable
/// upload buffer. Each call to `next` parses exactly one hand block.
pub struct HandStream<'a> {
    platform: Platform,
    blocks: std::vec::IntoIter<&'a str>,
}

impl<'a> HandStream<'a> {
    pub fn new(text: &'a str, platform: Platform) -> Self {
        Self {
            platform,
            blocks: hand_blocks(text, platform).into_iter(),
        }
    }
}

impl<'a> Iterator for HandStream<'a> {
    type Item = ParsedHand;

    fn next(&mut self) -> Option<ParsedHand> {
        let block = self.blocks.next()?;
        Some(parse_block(self.platform, block))
    }
}

/// Client chatter and connection noise that appears between actions and must
/// be dropped without disturbing action order.
pub(crate) fn is_artifact_line(line: &str) -> bool {
    const MARKERS: &[&str] = &[
        " is disconnected",
        " is connected",
        " has timed out",
        " has returned",
        " is sitting out",
        " sits out",
        " said, \"",
        " joins the table",
        " leaves the table",
        " will be allowed to play after the button",
        " was removed from the table",
        " has requested TIME",
        " wants to play",
    ];
    MARKERS.iter().any(|m| line.contains(m)) || line.starts_with("Time has expired")
}

/// Extracts the content of the first `[...]` group on a line.
pub(crate) fn bracket_content(line: &str) -> Option<&str> {
    let start = line.find('[')?;
    let end = line[start + 1..].find(']')? + start + 1;
    Some(line[start + 1..end].trim())
}

/// Extracts the content of the last `[...]` group on a line.
pub(crate) fn last_bracket_content(line: &str) -> Option<&str> {
    let end = line.rfind(']')?;
    let start = line[..end].rfind('[')?;
    Some(line[start + 1..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_blocks_splits_on_headers() {
        let text = "PokerStars Hand #1: x\nline\n\nPokerStars Hand #2: y\nline\n";
        let blocks = hand_blocks(text, Platform::Stars);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("PokerStars Hand #1"));
        assert!(blocks[1].starts_with("PokerStars Hand #2"));
    }

    #[test]
    fn test_hand_blocks_ignores_preamble() {
        let text = "export note\nPokerStars Hand #1: x\nline\n";
        let blocks = hand_blocks(text, Platform::Stars);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_hand_stream_yields_hands_in_file_order() {
        let text = "\
PokerStars Hand #11: Hold'em No Limit ($0.25/$0.50 USD) - 2024/03/01 20:00:00 ET
Table 'Aludra' 6-max Seat #1 is the button
Seat 1: alice ($50.00 in chips)
alice: posts small blind $0.25
*** SUMMARY ***
Total pot $0.25 | Rake $0.00

PokerStars Hand #12: Hold'em No Limit ($0.25/$0.50 USD) - 2024/03/01 20:01:00 ET
Table 'Aludra' 6-max Seat #1 is the button
Seat 1: alice ($50.00 in chips)
alice: posts small blind $0.25
";
        let mut stream = HandStream::new(text, Platform::Stars);
        let first = stream.next().unwrap();
        assert!(first.is_clean());
        assert_eq!(first.hand.hand_no.as_deref(), Some("11"));

        // Second block is cut off before its summary: still yielded, with
        // the error attached.
        let second = stream.next().unwrap();
        assert_eq!(second.hand.hand_no.as_deref(), Some("12"));
        assert_eq!(second.error, Some(ParseError::MissingSummary));

        assert!(stream.next().is_none());
        // Finite and non-restartable: exhausted is exhausted.
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_artifact_lines() {
        assert!(is_artifact_line("villain99 is disconnected"));
        assert!(is_artifact_line("bob said, \"nh: sir\""));
        assert!(is_artifact_line("alice has timed out"));
        assert!(!is_artifact_line("alice: folds"));
    }

    #[test]
    fn test_bracket_helpers() {
        assert_eq!(bracket_content("*** FLOP *** [2c 7d Jh]"), Some("2c 7d Jh"));
        assert_eq!(
            last_bracket_content("*** TURN *** [2c 7d Jh] [4s]"),
            Some("4s")
        );
        assert_eq!(bracket_content("no brackets"), None);
    }
}
