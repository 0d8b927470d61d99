//! Statistics reporting command.
//!
//! Loads the user's shard, computes a filtered snapshot through the core and
//! renders it either as a human-readable report or as JSON.

use crate::error::CliError;
use crate::persist;
use chrono::{NaiveDate, TimeZone, Utc};
use railbird_core::cache::AggregateCache;
use railbird_core::hand::GameType;
use railbird_core::money::Money;
use railbird_core::pipeline::Pipeline;
use railbird_core::stats::{PositionBucket, StatisticsSnapshot, StatsFilter};
use std::io::Write;

/// Filter flags as passed on the command line, before parsing.
#[derive(Debug, Default)]
pub struct StatsArgs {
    pub stakes: Option<String>,
    pub game: Option<String>,
    pub position: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub json: bool,
}

/// Handles the stats command.
pub fn handle_stats_command(
    user: &str,
    store_dir: &str,
    cache_ttl_secs: u64,
    args: StatsArgs,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let filter = build_filter(&args)?;
    let shard = persist::load_shard(store_dir, user)?;
    let cache = AggregateCache::new(chrono::Duration::seconds(cache_ttl_secs as i64));
    let pipeline = Pipeline::with_cache(cache);
    pipeline.store().restore_user(user, shard)?;
    let snapshot = pipeline.get_statistics(user, &filter)?;

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| CliError::Core(format!("failed to serialize snapshot: {}", e)))?;
        writeln!(out, "{}", json)?;
    } else {
        write_report(out, &snapshot)?;
    }
    Ok(())
}

fn build_filter(args: &StatsArgs) -> Result<StatsFilter, CliError> {
    let mut filter = StatsFilter {
        stakes: args.stakes.clone(),
        ..Default::default()
    };
    if let Some(game) = &args.game {
        filter.game = Some(parse_game(game)?);
    }
    if let Some(position) = &args.position {
        filter.position = Some(PositionBucket::parse(position).ok_or_else(|| {
            CliError::InvalidInput(format!("unknown position: {}", position))
        })?);
    }
    if let Some(from) = &args.from {
        filter.from = Some(parse_date(from)?);
    }
    if let Some(to) = &args.to {
        // Inclusive: the whole named day counts.
        let day = parse_date(to)?;
        filter.to = Some(day + chrono::Duration::days(1) - chrono::Duration::seconds(1));
    }
    Ok(filter)
}

fn parse_game(s: &str) -> Result<GameType, CliError> {
    match s.to_ascii_lowercase().as_str() {
        "nlhe" | "nl" => Ok(GameType::NoLimitHoldem),
        "lhe" | "limit" => Ok(GameType::LimitHoldem),
        "plo" | "omaha" => Ok(GameType::PotLimitOmaha),
        _ => Err(CliError::InvalidInput(format!("unknown game: {}", s))),
    }
}

fn parse_date(s: &str) -> Result<chrono::DateTime<Utc>, CliError> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CliError::InvalidInput(format!("invalid date (want YYYY-MM-DD): {}", s)))?;
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidInput(format!("invalid date: {}", s)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn write_report(out: &mut dyn Write, snap: &StatisticsSnapshot) -> Result<(), CliError> {
    writeln!(out, "user: {}", snap.user)?;
    writeln!(out, "hands: {} ({} excluded)", snap.hands, snap.excluded)?;
    writeln!(out, "net: {}", signed_money(snap.net))?;
    writeln!(out, "vpip: {:.1}%", snap.vpip_pct())?;
    writeln!(out, "pfr: {:.1}%", snap.pfr_pct())?;
    match snap.aggression_factor() {
        Some(af) => writeln!(out, "aggression factor: {:.2}", af)?,
        None => writeln!(out, "aggression factor: n/a")?,
    }
    writeln!(out, "won: {:.1}%", snap.win_rate_pct())?;
    if !snap.by_position.is_empty() {
        writeln!(out, "\nby position:")?;
        for (pos, line) in &snap.by_position {
            writeln!(
                out,
                "  {:<8} {:>6} hands  net {}",
                pos,
                line.hands,
                signed_money(line.net)
            )?;
        }
    }
    if !snap.by_stakes.is_empty() {
        writeln!(out, "\nby stakes:")?;
        for (stakes, line) in &snap.by_stakes {
            writeln!(
                out,
                "  {:<12} {:>6} hands  net {}",
                stakes,
                line.hands,
                signed_money(line.net)
            )?;
        }
    }
    Ok(())
}

fn signed_money(m: Money) -> String {
    if m.cents() < 0 {
        format!("-{}", m.abs())
    } else {
        format!("+{}", m)
    }
}
