//! PokerStars-style hand-history grammar.

use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use super::{bracket_content, is_artifact_line, last_bracket_content, ParsedHand};
use crate::cards::parse_card_list;
use crate::errors::ParseError;
use crate::hand::{
    Action, ActionKind, Board, Collection, GameType, Hand, Platform, Seat, Stakes, Street,
};
use crate::money::Money;

/// Parses one PokerStars-format hand block.
pub(super) fn parse_one(block: &str) -> ParsedHand {
    let mut err: Option<ParseError> = None;
    let mut hand = Hand {
        platform: Platform::Stars,
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
            if let Some(rest) = line
                .strip_prefix("PokerStars Hand #")
                .or_else(|| line.strip_prefix("PokerStars Game #"))
            {
                saw_header = true;
                record(&mut err, parse_header(rest, &mut hand));
            }
            continue;
        }
        if in_summary {
            if let Some(rest) = line.strip_prefix("Total pot ") {
                record(&mut err, parse_pot_line(rest, &mut hand));
            }
            // Per-seat summary lines and the Board echo repeat information
            // already captured from the body.
            continue;
        }
        if line.starts_with("*** ") {
            match street_marker(line) {
                Some(Marker::Street(s, wants_cards)) => {
                    street = s;
                    if wants_cards {
                        match board_cards(line, s, &mut hand.board) {
                            Ok(()) => {}
                            Err(e) => record(&mut err, Err(e)),
                        }
                    }
                }
                Some(Marker::Summary) => in_summary = true,
                Some(Marker::Showdown) | None => {}
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
            // Falls through: "Seat 3 is the button"-style lines belong to
            // other grammars and anything else is unexpected here.
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

pub(super) fn record(err: &mut Option<ParseError>, r: Result<(), ParseError>) {
    if let Err(e) = r {
        if err.is_none() {
            *err = Some(e);
        }
    }
}

pub(super) fn first_line(block: &str) -> String {
    block.lines().next().unwrap_or_default().chars().take(80).collect()
}

pub(super) enum Marker {
    Street(Street, bool),
    Showdown,
    Summary,
}

pub(super) fn street_marker(line: &str) -> Option<Marker> {
    if line.starts_with("*** HOLE CARDS ***") {
        Some(Marker::Street(Street::Preflop, false))
    } else if line.starts_with("*** FLOP ***") {
        Some(Marker::Street(Street::Flop, true))
    } else if line.starts_with("*** TURN ***") {
        Some(Marker::Street(Street::Turn, true))
    } else if line.starts_with("*** RIVER ***") {
        Some(Marker::Street(Street::River, true))
    } else if line.starts_with("*** SHOW DOWN ***") || line.starts_with("*** SHOWDOWN ***") {
        Some(Marker::Showdown)
    } else if line.starts_with("*** SUMMARY ***") {
        Some(Marker::Summary)
    } else {
        None
    }
}

pub(super) fn board_cards(line: &str, street: Street, board: &mut Board) -> Result<(), ParseError> {
    let name = match street {
        Street::Flop => "FLOP",
        Street::Turn => "TURN",
        Street::River => "RIVER",
        Street::Preflop => return Ok(()),
    };
    match street {
        Street::Flop => {
            let inner = bracket_content(line)
                .ok_or_else(|| ParseError::TruncatedBlock(name.to_string()))?;
            board.flop = parse_card_list(inner)?;
            if board.flop.len() != 3 {
                return Err(ParseError::TruncatedBlock(name.to_string()));
            }
        }
        Street::Turn | Street::River => {
            // "[2c 7d Jh] [4s]": the new card is the last bracket group.
            let inner = last_bracket_content(line)
                .ok_or_else(|| ParseError::TruncatedBlock(name.to_string()))?;
            let cards = parse_card_list(inner)?;
            let [card] = cards.as_slice() else {
                return Err(ParseError::TruncatedBlock(name.to_string()));
            };
            if street == Street::Turn {
                board.turn = Some(*card);
            } else {
                board.river = Some(*card);
            }
        }
        Street::Preflop => {}
    }
    Ok(())
}

fn parse_header(rest: &str, hand: &mut Hand) -> Result<(), ParseError> {
    // "243710538937:  Hold'em No Limit ($0.25/$0.50 USD) - 2024/01/15 20:11:33 ET"
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
        parse_timestamp(ts, hand);
    }
    Ok(())
}

pub(super) fn game_type(s: &str) -> Option<GameType> {
    if s.contains("Hold'em No Limit") || s.contains("Holdem No Limit") {
        Some(GameType::NoLimitHoldem)
    } else if s.contains("Hold'em Limit") || s.contains("Hold'em Fixed Limit") {
        Some(GameType::LimitHoldem)
    } else if s.contains("Omaha Pot Limit") || s.contains("Pot Limit Omaha") {
        Some(GameType::PotLimitOmaha)
    } else {
        None
    }
}

pub(super) fn parse_stakes(s: &str, stakes: &mut Stakes) -> Result<(), ParseError> {
    // "$0.25/$0.50 USD" or "$0.05/$0.10"
    let mut body = s.trim();
    if let Some((amounts, cur)) = body.rsplit_once(' ') {
        if cur.chars().all(|c| c.is_ascii_alphabetic()) && cur.len() == 3 {
            stakes.currency = cur.to_string();
            body = amounts.trim();
        }
    }
    let (sb, bb) = body
        .split_once('/')
        .ok_or_else(|| ParseError::BadHeader(s.to_string()))?;
    stakes.small_blind = Money::parse(sb)?;
    stakes.big_blind = Money::parse(bb)?;
    Ok(())
}

fn parse_timestamp(ts: &str, hand: &mut Hand) {
    // "2024/01/15 20:11:33 ET" possibly followed by a bracketed local echo.
    // Checked slicing: byte 19 may fall inside a multi-byte character when
    // the tail is not a timestamp at all.
    let ts = ts.split(" [").next().unwrap_or(ts).trim();
    let (dt_part, tz) = match (ts.get(..19), ts.get(19..)) {
        (Some(dt), Some(rest)) => (dt, rest.trim()),
        _ => (ts, ""),
    };
    match NaiveDateTime::parse_from_str(dt_part, "%Y/%m/%d %H:%M:%S") {
        Ok(naive) => {
            hand.played_at = Some(Utc.from_utc_datetime(&naive));
            if !tz.is_empty() {
                hand.timezone = Some(tz.to_string());
            }
        }
        Err(_) => {
            debug!(ts, "unparseable header timestamp");
        }
    }
}

pub(super) fn parse_table_line(rest: &str, hand: &mut Hand) -> Result<(), ParseError> {
    // "'Aludra III' 6-max Seat #3 is the button"
    let rest = rest.trim();
    if let Some(stripped) = rest.strip_prefix('\'') {
        let end = stripped
            .find('\'')
            .ok_or_else(|| ParseError::BadHeader(rest.to_string()))?;
        hand.table = stripped[..end].to_string();
        let tail = &stripped[end + 1..];
        for token in tail.split_whitespace() {
            if let Some(n) = token.strip_suffix("-max") {
                hand.max_seats = n.parse().unwrap_or(0);
            }
            if let Some(n) = token.strip_prefix("#") {
                hand.button_seat = n.parse().unwrap_or(0);
            }
        }
        Ok(())
    } else {
        Err(ParseError::BadHeader(rest.to_string()))
    }
}

pub(super) fn parse_seat_line(rest: &str) -> Result<Seat, ParseError> {
    // "4: hero ($50.00 in chips)" with an optional " is sitting out" suffix
    let (no, tail) = rest
        .split_once(':')
        .ok_or_else(|| ParseError::BadHeader(rest.to_string()))?;
    let number: u8 = no
        .trim()
        .parse()
        .map_err(|_| ParseError::BadHeader(rest.to_string()))?;
    let tail = tail.trim_end_matches(" is sitting out").trim();
    let open = tail
        .rfind('(')
        .ok_or_else(|| ParseError::BadHeader(rest.to_string()))?;
    let name = tail[..open].trim().to_string();
    let stack_str = tail[open + 1..]
        .trim_end_matches(')')
        .trim_end_matches("in chips")
        .trim();
    Ok(Seat {
        number,
        name,
        stack: Money::parse(stack_str)?,
    })
}

pub(super) fn parse_dealt_line(rest: &str, hand: &mut Hand) -> Result<(), ParseError> {
    let open = rest
        .find('[')
        .ok_or_else(|| ParseError::TruncatedBlock("HOLE CARDS".to_string()))?;
    let close = rest
        .rfind(']')
        .ok_or_else(|| ParseError::TruncatedBlock("HOLE CARDS".to_string()))?;
    let name = rest[..open].trim().to_string();
    let cards = parse_card_list(&rest[open + 1..close])?;
    // Omaha histories deal other players' mucked cards too; keep hero's only.
    if hand.hero.is_none() {
        hand.hero = Some(name);
        hand.hole_cards = cards;
    }
    Ok(())
}

pub(super) fn parse_uncalled_line(rest: &str, street: Street, hand: &mut Hand) -> Result<(), ParseError> {
    // "($2.00) returned to hero"
    let close = rest
        .find(')')
        .ok_or_else(|| ParseError::BadAction(rest.to_string()))?;
    let amount = Money::parse(&rest[..close])?;
    let player = rest[close + 1..]
        .trim()
        .strip_prefix("returned to ")
        .ok_or_else(|| ParseError::BadAction(rest.to_string()))?
        .trim()
        .to_string();
    hand.actions.push(Action {
        street,
        player,
        kind: ActionKind::Return,
        amount,
    });
    Ok(())
}

pub(super) fn collected_line(line: &str) -> Option<(&str, &str)> {
    // "hero collected $3.10 from pot" / "from main pot" / "from side pot"
    let idx = line.find(" collected ")?;
    let player = &line[..idx];
    let tail = &line[idx + " collected ".len()..];
    let amount = tail.split_whitespace().next()?;
    tail.contains("pot").then_some((player, amount))
}

pub(super) fn parse_action_line(line: &str, street: Street) -> Result<Option<Action>, ParseError> {
    let Some((player, verb)) = line.rsplit_once(": ") else {
        // Narration lines like "hero: doesn't show hand" carry a colon too,
        // so anything without one is noise at this point.
        return Ok(None);
    };
    let verb = verb.trim().trim_end_matches(" and is all-in").trim();
    let mk = |kind, amount| {
        Ok(Some(Action {
            street,
            player: player.to_string(),
            kind,
            amount,
        }))
    };
    if verb == "folds" || verb.starts_with("folds ") {
        return mk(ActionKind::Fold, Money::ZERO);
    }
    if verb == "checks" {
        return mk(ActionKind::Check, Money::ZERO);
    }
    if let Some(a) = verb.strip_prefix("calls ") {
        return mk(ActionKind::Call, first_amount(a)?);
    }
    if let Some(a) = verb.strip_prefix("bets ") {
        return mk(ActionKind::Bet, first_amount(a)?);
    }
    if let Some(a) = verb.strip_prefix("raises ") {
        // "raises $1.00 to $1.50": the raise-to figure is authoritative.
        let to = a
            .split_once(" to ")
            .map(|(_, t)| t)
            .ok_or_else(|| ParseError::BadAction(line.to_string()))?;
        return mk(ActionKind::RaiseTo, first_amount(to)?);
    }
    if let Some(a) = verb.strip_prefix("posts small blind ") {
        return mk(ActionKind::PostSmallBlind, first_amount(a)?);
    }
    if let Some(a) = verb.strip_prefix("posts big blind ") {
        return mk(ActionKind::PostBigBlind, first_amount(a)?);
    }
    if let Some(a) = verb.strip_prefix("posts the ante ") {
        return mk(ActionKind::PostAnte, first_amount(a)?);
    }
    if let Some(a) = verb.strip_prefix("posts small & big blinds ") {
        return mk(ActionKind::PostBigBlind, first_amount(a)?);
    }
    if verb.starts_with("shows ")
        || verb.starts_with("mucks")
        || verb.starts_with("doesn't show")
        || verb.starts_with("has mucked")
        || verb.starts_with("cashed out")
    {
        return Ok(None);
    }
    Err(ParseError::BadAction(line.to_string()))
}

pub(super) fn first_amount(s: &str) -> Result<Money, ParseError> {
    let token = s
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::BadAmount(s.to_string()))?;
    Money::parse(token)
}

pub(super) fn parse_pot_line(rest: &str, hand: &mut Hand) -> Result<(), ParseError> {
    // "$3.25 | Rake $0.15" or "$10.00 Main pot $8.00. Side pot $2.00. | Rake $0.50"
    let total = first_amount(rest)?;
    hand.total_pot = Some(total);
    if let Some(idx) = rest.find("Rake ") {
        let mut rake = first_amount(&rest[idx + 5..])?;
        // GG prints a jackpot fee after the rake; both leave the pot.
        if let Some(j) = rest.find("Jackpot ") {
            rake += first_amount(&rest[j + 8..])?;
        }
        hand.rake = Some(rake);
    }
    Ok(())
}
