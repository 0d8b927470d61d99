//! partypoker-style hand-history grammar.
//!
//! Structurally unlike the Stars family: bracketed `[$x USD]` amounts,
//! `** Dealing ... **` street markers, no summary section (the pot is only
//! implied by the `wins` lines), and raise amounts printed additively. Raises
//! are normalized to raise-to during parsing so the [`Hand`] action sequence
//! has one meaning across platforms.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use super::{bracket_content, is_artifact_line, ParsedHand};
use crate::cards::parse_card_list;
use crate::errors::ParseError;
use crate::hand::{
    Action, ActionKind, Board, Collection, GameType, Hand, Platform, Seat, Stakes, Street,
};
use crate::money::Money;

/// Parses one partypoker-format hand block.
pub(super) fn parse_one(block: &str) -> ParsedHand {
    let mut err: Option<ParseError> = None;
    let mut hand = Hand {
        platform: Platform::Party,
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
    let mut saw_header = false;
    let mut saw_stakes_line = false;
    // Street commitments per player, for additive-raise normalization.
    let mut commits: Vec<(String, Money)> = Vec::new();

    for raw_line in block.lines() {
        let line = raw_line.trim().trim_end_matches('.');
        if line.is_empty() || is_artifact_line(line) || is_party_noise(line) {
            continue;
        }
        if !saw_header {
            if let Some(rest) = line.strip_prefix("***** Hand History for Game ") {
                saw_header = true;
                let no = rest.trim_end_matches('*').trim();
                if no.is_empty() {
                    record(&mut err, ParseError::BadHeader(line.to_string()));
                } else {
                    hand.hand_no = Some(no.to_string());
                }
            }
            continue;
        }
        if !saw_stakes_line && line.starts_with('$') {
            saw_stakes_line = true;
            if let Err(e) = parse_stakes_line(line, &mut hand) {
                record(&mut err, e);
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("Table ") {
            if hand.table.is_empty() {
                hand.table = rest
                    .split(" (")
                    .next()
                    .unwrap_or(rest)
                    .trim()
                    .to_string();
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("Total number of players : ") {
            if let Some((_, max)) = rest.split_once('/') {
                hand.max_seats = max.trim().parse().unwrap_or(0);
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("Seat ") {
            if let Some(n) = rest.strip_suffix(" is the button") {
                hand.button_seat = n.trim().parse().unwrap_or(0);
                continue;
            }
            match parse_seat_line(rest) {
                Ok(seat) => hand.seats.push(seat),
                Err(e) => record(&mut err, e),
            }
            continue;
        }
        if line.starts_with("** Dealing") || line.starts_with("** Summary") {
            match dealing_marker(line, &mut hand.board) {
                Ok(Some(s)) => {
                    street = s;
                    commits.clear();
                }
                Ok(None) => {}
                Err(e) => record(&mut err, e),
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("Dealt to ") {
            match parse_dealt_line(rest) {
                Ok((name, cards)) => {
                    hand.hero = Some(name);
                    hand.hole_cards = cards;
                }
                Err(e) => record(&mut err, e),
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("Uncalled bet [") {
            match parse_uncalled(rest) {
                Ok((player, amount)) => {
                    adjust_commit(&mut commits, &player, -amount.cents());
                    hand.actions.push(Action {
                        street,
                        player,
                        kind: ActionKind::Return,
                        amount,
                    });
                }
                Err(e) => record(&mut err, e),
            }
            continue;
        }
        if let Some((player, amount)) = wins_line(line) {
            match Money::parse(amount) {
                Ok(m) => hand.collections.push(Collection {
                    player: player.to_string(),
                    amount: m,
                }),
                Err(e) => record(&mut err, e),
            }
            continue;
        }
        match parse_action_line(line, street, &mut commits) {
            Ok(Some(action)) => hand.actions.push(action),
            Ok(None) => {}
            Err(e) => {
                debug!(line, "unparseable action line");
                record(&mut err, e);
            }
        }
    }

    if !saw_header {
        record(
            &mut err,
            ParseError::BadHeader(block.lines().next().unwrap_or_default().to_string()),
        );
    } else if hand.collections.is_empty() {
        // Every complete party hand ends with at least one wins line.
        record(&mut err, ParseError::MissingSummary);
    }
    ParsedHand { hand, error: err }
}

fn record(err: &mut Option<ParseError>, e: ParseError) {
    if err.is_none() {
        *err = Some(e);
    }
}

fn is_party_noise(line: &str) -> bool {
    line.starts_with("Your time bank")
        || line.ends_with("has joined the table")
        || line.ends_with("has left the table")
        || line.starts_with("Game #")
        || line.ends_with("does not show cards")
        || line.contains(" shows [ ")
        || line.ends_with("doesn't show cards")
}

fn parse_stakes_line(line: &str, hand: &mut Hand) -> Result<(), ParseError> {
    // "$0.50/$1 USD NL Texas Hold'em - Monday, January 15, 20:11:33 CET 2024"
    let (head, ts) = match line.split_once(" - ") {
        Some((h, t)) => (h, Some(t)),
        None => (line, None),
    };
    let mut tokens = head.split_whitespace();
    let amounts = tokens
        .next()
        .ok_or_else(|| ParseError::BadHeader(line.to_string()))?;
    let (sb, bb) = amounts
        .split_once('/')
        .ok_or_else(|| ParseError::BadHeader(line.to_string()))?;
    hand.stakes.small_blind = Money::parse(sb)?;
    hand.stakes.big_blind = Money::parse(bb)?;
    let rest: Vec<&str> = tokens.collect();
    if let Some(cur) = rest.first() {
        if cur.len() == 3 && cur.chars().all(|c| c.is_ascii_uppercase()) {
            hand.stakes.currency = cur.to_string();
        }
    }
    let game_str = rest.join(" ");
    hand.game = if game_str.contains("NL Texas Hold'em") {
        GameType::NoLimitHoldem
    } else if game_str.contains("PL Omaha") {
        GameType::PotLimitOmaha
    } else if game_str.contains("Texas Hold'em") {
        GameType::LimitHoldem
    } else {
        return Err(ParseError::BadHeader(line.to_string()));
    };
    if let Some(ts) = ts {
        parse_timestamp(ts, hand);
    }
    Ok(())
}

fn parse_timestamp(ts: &str, hand: &mut Hand) {
    // "Monday, January 15, 20:11:33 CET 2024"
    let Some((_, rest)) = ts.split_once(", ") else {
        return;
    };
    let mut tokens = rest.replace(',', " ");
    tokens = tokens.split_whitespace().collect::<Vec<_>>().join(" ");
    let parts: Vec<&str> = tokens.split(' ').collect();
    let [month, day, time, tz, year] = parts.as_slice() else {
        debug!(ts, "unparseable party timestamp");
        return;
    };
    let month_no = match *month {
        "January" => 1,
        "February" => 2,
        "March" => 3,
        "April" => 4,
        "May" => 5,
        "June" => 6,
        "July" => 7,
        "August" => 8,
        "September" => 9,
        "October" => 10,
        "November" => 11,
        "December" => 12,
        _ => return,
    };
    let (Ok(day), Ok(year)) = (day.parse::<u32>(), year.parse::<i32>()) else {
        return;
    };
    let Some(date) = NaiveDate::from_ymd_opt(year, month_no, day) else {
        return;
    };
    let Ok(naive_time) = chrono::NaiveTime::parse_from_str(time, "%H:%M:%S") else {
        return;
    };
    let naive = NaiveDateTime::new(date, naive_time);
    hand.played_at = Some(Utc.from_utc_datetime(&naive));
    hand.timezone = Some((*tz).to_string());
}

fn parse_seat_line(rest: &str) -> Result<Seat, ParseError> {
    // "1: alice ( $100.00 USD )"
    let (no, tail) = rest
        .split_once(':')
        .ok_or_else(|| ParseError::BadHeader(rest.to_string()))?;
    let number: u8 = no
        .trim()
        .parse()
        .map_err(|_| ParseError::BadHeader(rest.to_string()))?;
    let open = tail
        .rfind('(')
        .ok_or_else(|| ParseError::BadHeader(rest.to_string()))?;
    let name = tail[..open].trim().to_string();
    let stack_str = tail[open + 1..]
        .trim_end_matches(')')
        .trim()
        .trim_end_matches("USD")
        .trim();
    Ok(Seat {
        number,
        name,
        stack: Money::parse(stack_str)?,
    })
}

fn dealing_marker(line: &str, board: &mut Board) -> Result<Option<Street>, ParseError> {
    if line.starts_with("** Dealing down cards **") {
        return Ok(Some(Street::Preflop));
    }
    let (street, name) = if line.starts_with("** Dealing Flop **") {
        (Street::Flop, "Flop")
    } else if line.starts_with("** Dealing Turn **") {
        (Street::Turn, "Turn")
    } else if line.starts_with("** Dealing River **") {
        (Street::River, "River")
    } else {
        return Ok(None);
    };
    let inner = bracket_content(line)
        .ok_or_else(|| ParseError::TruncatedBlock(name.to_string()))?
        .replace(',', " ");
    let cards = parse_card_list(&inner)?;
    match street {
        Street::Flop => {
            if cards.len() != 3 {
                return Err(ParseError::TruncatedBlock(name.to_string()));
            }
            board.flop = cards;
        }
        Street::Turn => {
            let [c] = cards.as_slice() else {
                return Err(ParseError::TruncatedBlock(name.to_string()));
            };
            board.turn = Some(*c);
        }
        Street::River => {
            let [c] = cards.as_slice() else {
                return Err(ParseError::TruncatedBlock(name.to_string()));
            };
            board.river = Some(*c);
        }
        Street::Preflop => {}
    }
    Ok(Some(street))
}

fn parse_dealt_line(rest: &str) -> Result<(String, Vec<crate::cards::Card>), ParseError> {
    let open = rest
        .find('[')
        .ok_or_else(|| ParseError::TruncatedBlock("down cards".to_string()))?;
    let close = rest
        .rfind(']')
        .ok_or_else(|| ParseError::TruncatedBlock("down cards".to_string()))?;
    let name = rest[..open].trim().to_string();
    let inner = rest[open + 1..close].replace(',', " ");
    Ok((name, parse_card_list(&inner)?))
}

fn parse_uncalled(rest: &str) -> Result<(String, Money), ParseError> {
    // "$2 USD] returned to hero"
    let close = rest
        .find(']')
        .ok_or_else(|| ParseError::BadAction(rest.to_string()))?;
    let amount = bracket_amount_inner(&rest[..close])?;
    let player = rest[close + 1..]
        .trim()
        .strip_prefix("returned to ")
        .ok_or_else(|| ParseError::BadAction(rest.to_string()))?
        .trim()
        .to_string();
    Ok((player, amount))
}

fn wins_line(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(" wins ")?;
    let player = &line[..idx];
    let amount = line[idx + " wins ".len()..].split_whitespace().next()?;
    Some((player, amount))
}

fn commit_of(commits: &[(String, Money)], player: &str) -> Money {
    commits
        .iter()
        .find(|(p, _)| p == player)
        .map(|(_, m)| *m)
        .unwrap_or(Money::ZERO)
}

fn adjust_commit(commits: &mut Vec<(String, Money)>, player: &str, delta_cents: i64) {
    if let Some(entry) = commits.iter_mut().find(|(p, _)| p == player) {
        entry.1 += Money(delta_cents);
    } else {
        commits.push((player.to_string(), Money(delta_cents)));
    }
}

fn parse_action_line(
    line: &str,
    street: Street,
    commits: &mut Vec<(String, Money)>,
) -> Result<Option<Action>, ParseError> {
    let mk = |player: &str, kind, amount| {
        Ok(Some(Action {
            street,
            player: player.to_string(),
            kind,
            amount,
        }))
    };
    if let Some(player) = line.strip_suffix(" folds") {
        return mk(player, ActionKind::Fold, Money::ZERO);
    }
    if let Some(player) = line.strip_suffix(" checks") {
        return mk(player, ActionKind::Check, Money::ZERO);
    }
    if let Some(idx) = line.find(" posts small blind [") {
        let amount = bracket_amount(&line[idx..])?;
        adjust_commit(commits, &line[..idx], amount.cents());
        return mk(&line[..idx], ActionKind::PostSmallBlind, amount);
    }
    if let Some(idx) = line.find(" posts big blind [") {
        let amount = bracket_amount(&line[idx..])?;
        adjust_commit(commits, &line[..idx], amount.cents());
        return mk(&line[..idx], ActionKind::PostBigBlind, amount);
    }
    if let Some(idx) = line.find(" posts ante [") {
        let amount = bracket_amount(&line[idx..])?;
        return mk(&line[..idx], ActionKind::PostAnte, amount);
    }
    if let Some(idx) = line.find(" calls [") {
        let amount = bracket_amount(&line[idx..])?;
        adjust_commit(commits, &line[..idx], amount.cents());
        return mk(&line[..idx], ActionKind::Call, amount);
    }
    if let Some(idx) = line.find(" bets [") {
        let amount = bracket_amount(&line[idx..])?;
        adjust_commit(commits, &line[..idx], amount.cents());
        return mk(&line[..idx], ActionKind::Bet, amount);
    }
    if let Some(idx) = line.find(" raises [") {
        // Additive amount: normalize to the raise-to total for this street.
        let player = &line[..idx];
        let added = bracket_amount(&line[idx..])?;
        let to = commit_of(commits, player) + added;
        adjust_commit(commits, player, added.cents());
        return mk(player, ActionKind::RaiseTo, to);
    }
    if let Some(idx) = line.find(" is all-In [") {
        // All-in chips are additive like a bet; aggression attribution is
        // resolved downstream from the facing-bet context if ever needed.
        let amount = bracket_amount(&line[idx..])?;
        adjust_commit(commits, &line[..idx], amount.cents());
        return mk(&line[..idx], ActionKind::Bet, amount);
    }
    Err(ParseError::BadAction(line.to_string()))
}

fn bracket_amount(s: &str) -> Result<Money, ParseError> {
    let inner = bracket_content(s).ok_or_else(|| ParseError::BadAction(s.to_string()))?;
    bracket_amount_inner(inner)
}

fn bracket_amount_inner(inner: &str) -> Result<Money, ParseError> {
    let token = inner
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::BadAmount(inner.to_string()))?;
    Money::parse(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAND: &str = "\
***** Hand History for Game 2264170530 *****
$0.50/$1 USD NL Texas Hold'em - Monday, January 15, 20:11:33 CET 2024
Table Tahoe (Real Money)
Seat 3 is the button
Total number of players : 6/6
Seat 1: alice ( $100.00 USD )
Seat 2: bob ( $85.50 USD )
Seat 3: carol ( $120.00 USD )
Seat 4: hero ( $100.00 USD )
alice posts small blind [$0.50 USD].
bob posts big blind [$1 USD].
** Dealing down cards **
Dealt to hero [ Ah Kd ]
carol folds.
hero raises [$3 USD].
alice folds.
bob calls [$2 USD].
** Dealing Flop ** [ 2c, 7d, Jh ]
bob checks.
hero bets [$4 USD].
bob folds.
Uncalled bet [$4 USD] returned to hero.
hero does not show cards.
hero wins $6.20 USD
";

    #[test]
    fn test_parse_party_hand() {
        let parsed = parse_one(HAND);
        assert!(parsed.is_clean(), "error: {:?}", parsed.error);
        let h = &parsed.hand;
        assert_eq!(h.platform, Platform::Party);
        assert_eq!(h.hand_no.as_deref(), Some("2264170530"));
        assert_eq!(h.stakes.small_blind, Money(50));
        assert_eq!(h.stakes.big_blind, Money(100));
        assert_eq!(h.game, GameType::NoLimitHoldem);
        assert_eq!(h.table, "Tahoe");
        assert_eq!(h.max_seats, 6);
        assert_eq!(h.button_seat, 3);
        assert_eq!(h.timezone.as_deref(), Some("CET"));
        assert_eq!(h.hero.as_deref(), Some("hero"));
        assert_eq!(h.seats.len(), 4);
        assert_eq!(h.board.flop.len(), 3);
        assert_eq!(h.collections.len(), 1);
        assert_eq!(h.collections[0].amount, Money(620));
    }

    #[test]
    fn test_additive_raise_normalized_to_raise_to() {
        let parsed = parse_one(HAND);
        let raise = parsed
            .hand
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::RaiseTo)
            .unwrap();
        // "raises [$3]" on top of nothing committed preflop -> raise to $3.
        assert_eq!(raise.amount, Money(300));
        let c = parsed.hand.contributions();
        assert_eq!(c["hero"], Money(300));
        assert_eq!(c["bob"], Money(300));
        assert_eq!(c["alice"], Money(50));
    }

    #[test]
    fn test_no_wins_line_marks_partial() {
        let truncated: String = HAND
            .lines()
            .take_while(|l| !l.contains(" wins "))
            .map(|l| format!("{}\n", l))
            .collect();
        let parsed = parse_one(&truncated);
        assert_eq!(parsed.error, Some(ParseError::MissingSummary));
        assert!(!parsed.hand.actions.is_empty());
    }

    #[test]
    fn test_party_timestamp() {
        let parsed = parse_one(HAND);
        let ts = parsed.hand.played_at.unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T20:11:33+00:00");
    }

    #[test]
    fn test_bb_reraise_uses_street_commit() {
        let hand = "\
***** Hand History for Game 9 *****
$0.50/$1 USD NL Texas Hold'em - Monday, January 15, 20:11:33 CET 2024
Table Tahoe (Real Money)
Seat 1 is the button
Total number of players : 2/6
Seat 1: alice ( $100.00 USD )
Seat 2: hero ( $100.00 USD )
alice posts small blind [$0.50 USD].
hero posts big blind [$1 USD].
** Dealing down cards **
Dealt to hero [ Ah Kd ]
alice raises [$2.50 USD].
hero raises [$8 USD].
alice folds.
Uncalled bet [$6 USD] returned to hero.
hero wins $6 USD
";
        let parsed = parse_one(hand);
        assert!(parsed.is_clean(), "error: {:?}", parsed.error);
        let raises: Vec<Money> = parsed
            .hand
            .actions
            .iter()
            .filter(|a| a.kind == ActionKind::RaiseTo)
            .map(|a| a.amount)
            .collect();
        // alice: 0.50 committed + 2.50 = raise to 3.00; hero: 1 + 8 = 9.00
        assert_eq!(raises, vec![Money(300), Money(900)]);
        let c = parsed.hand.contributions();
        assert_eq!(c["alice"], Money(300));
        assert_eq!(c["hero"], Money(300));
    }
}
