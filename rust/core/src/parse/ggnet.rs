//! GG-network hand-history grammar.
//!
//! GG exports deliberately mimic the Stars block layout, so this grammar
//! reuses the shared line primitives and adds what GG does differently:
//! `#HD`-prefixed hand numbers, a jackpot fee on the rake line, and
//! run-it-twice `FIRST`/`SECOND` board blocks.

use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use super::stars::{
    board_cards, collected_line, first_line, game_type, parse_action_line, parse_dealt_line,
    parse_pot_line, parse_seat_line, parse_stakes, parse_table_line, parse_uncalled_line, record,
    street_marker, Marker,
};
use super::{is_artifact_line, last_bracket_content, ParsedHand};
use crate::cards::parse_card_list;
use crate::errors::ParseError;
use crate::hand::{Board, Collection, GameType, Hand, Platform, Stakes, Street};
use crate::money::Money;

/// Parses one GG-format hand block.
pub(super) fn parse_one(block: &str) -> ParsedHand {
    let mut err: Option<ParseError> = None;
    let mut hand = Hand {
        platform: Platform::GgNet,
        hand_no: None,
        game: GameType::NoLimitHoldem,
        stakes: Stakes {
            small_blind: Money::ZERO,
            big_blind: Money::ZERO,
            ante: Money::ZERO,
            currency: "USD".to_string(),
        },
        table: String::new(),
        max_seats: 0,
        button_seat: 0,
        played_at: None,
        timezone: None,
        hero: None,
        hole_cards: Vec::new(),
        seats: Vec::new(),
        actions: Vec::new(),
        board: Board::default(),
        collections: Vec::new(),
        total_pot: None,
        rake: None,
        note: None,
        raw: block.to_string(),
    };

    let mut street = Street::Preflop;
    let mut in_summary = false;
    let mut saw_header = false;

    for raw_line in block.lines() {
        let line = raw_line.trim();
        if line.is_empty() || is_artifact_line(line) {
            continue;
        }
        if !saw_header {
            if let Some(rest) = line.strip_prefix("Poker Hand #") {
                saw_header = true;
                record(&mut err, parse_header(rest, &mut hand));
            }
            continue;
        }
        if in_summary {
            if let Some(rest) = line.strip_prefix("Total pot ") {
                record(&mut err, parse_pot_line(rest, &mut hand));
            }
            continue;
        }
        if line.starts_with("*** ") {
            match run_it_twice_marker(line) {
                Some(RitMarker::First(s)) => {
                    street = s;
                    if let Err(e) = board_cards(line, s, &mut hand.board) {
                        record(&mut err, Err(e));
                    }
                }
                Some(RitMarker::Second) => {
                    if let Err(e) = second_board(line, &mut hand.board) {
                        record(&mut err, Err(e));
                    }
                }
                None => match street_marker(line) {
                    Some(Marker::Street(s, wants_cards)) => {
                        street = s;
                        if wants_cards {
                            if let Err(e) = board_cards(line, s, &mut hand.board) {
                                record(&mut err, Err(e));
                            }
                        }
                    }
                    Some(Marker::Summary) => in_summary = true,
                    Some(Marker::Showdown) | None => {}
                },
            }
            continue;
        }
        if hand.table.is_empty() {
            if let Some(rest) = line.strip_prefix("Table ") {
                record(&mut err, parse_table_line(rest, &mut hand));
                continue;
            }
        }
        if let Some(rest) = line.strip_prefix("Seat ") {
            if let Ok(seat) = parse_seat_line(rest) {
                hand.seats.push(seat);
                continue;
            }
        }
        if let Some(rest) = line.strip_prefix("Dealt to ") {
            record(&mut err, parse_dealt_line(rest, &mut hand));
            continue;
        }
        if let Some(rest) = line.strip_prefix("Uncalled bet (") {
            record(&mut err, parse_uncalled_line(rest, street, &mut hand));
            continue;
        }
        if let Some((player, amount)) = collected_line(line) {
            match Money::parse(amount) {
                Ok(m) => hand.collections.push(Collection {
                    player: player.to_string(),
                    amount: m,
                }),
                Err(e) => record(&mut err, Err(e)),
            }
            continue;
        }
        match parse_action_line(line, street) {
            Ok(Some(action)) => hand.actions.push(action),
            Ok(None) => {}
            Err(e) => {
                debug!(line, "unparseable action line");
                record(&mut err, Err(e));
            }
        }
    }

    if !saw_header {
        record(&mut err, Err(ParseError::BadHeader(first_line(block))));
    } else if !in_summary {
        record(&mut err, Err(ParseError::MissingSummary));
    }
    ParsedHand { hand, error: err }
}

fn parse_header(rest: &str, hand: &mut Hand) -> Result<(), ParseError> {
    // "HD1017890: Hold'em No Limit ($0.05/$0.10) - 2024/01/15 12:00:00"
    let (no, tail) = rest
        .split_once(':')
        .ok_or_else(|| ParseError::BadHeader(rest.to_string()))?;
    hand.hand_no = Some(no.trim().to_string());
    hand.game = game_type(tail).ok_or_else(|| ParseError::BadHeader(tail.to_string()))?;
    let open = tail
        .find('(')
        .ok_or_else(|| ParseError::BadHeader(tail.to_string()))?;
    let close = tail[open..]
        .find(')')
        .map(|i| i + open)
        .ok_or_else(|| ParseError::BadHeader(tail.to_string()))?;
    parse_stakes(&tail[open + 1..close], &mut hand.stakes)?;
    if let Some((_, ts)) = tail.split_once(" - ") {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts.trim(), "%Y/%m/%d %H:%M:%S") {
            hand.played_at = Some(Utc.from_utc_datetime(&naive));
        } else {
            debug!(ts, "unparseable GG header timestamp");
        }
    }
    Ok(())
}

enum RitMarker {
    First(Street),
    Second,
}

fn run_it_twice_marker(line: &str) -> Option<RitMarker> {
    if line.starts_with("*** FIRST FLOP ***") {
        Some(RitMarker::First(Street::Flop))
    } else if line.starts_with("*** FIRST TURN ***") {
        Some(RitMarker::First(Street::Turn))
    } else if line.starts_with("*** FIRST RIVER ***") {
        Some(RitMarker::First(Street::River))
    } else if line.starts_with("*** SECOND FLOP ***")
        || line.starts_with("*** SECOND TURN ***")
        || line.starts_with("*** SECOND RIVER ***")
    {
        Some(RitMarker::Second)
    } else {
        None
    }
}

fn second_board(line: &str, board: &mut Board) -> Result<(), ParseError> {
    let inner = last_bracket_content(line)
        .ok_or_else(|| ParseError::TruncatedBlock("SECOND BOARD".to_string()))?;
    let cards = parse_card_list(inner)?;
    board.second.get_or_insert_with(Vec::new).extend(cards);
    Ok(())
}
