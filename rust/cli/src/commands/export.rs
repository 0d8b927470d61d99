//! Stored hand export command.
//!
//! Converts a user's persisted shard into CSV, a JSON array, or a SQLite
//! database for downstream tooling.

use crate::error::CliError;
use crate::persist;
use crate::ui;
use railbird_core::money::Money;
use railbird_core::store::{StoredHand, UserShard};
use std::io::Write;

/// Handles the export command.
///
/// # Arguments
///
/// * `user` - Owner of the shard to export
/// * `store_dir` - Directory with per-user shard files
/// * `format` - Output format ("csv", "json", or "sqlite")
/// * `output` - Path to output file
/// * `err` - Output stream for error messages
///
/// # Returns
///
/// `Result<(), CliError>`: `Ok(())` when export completes successfully.
pub fn handle_export_command(
    user: &str,
    store_dir: &str,
    format: &str,
    output: &str,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let shard = persist::load_shard(store_dir, user)?;
    match format {
        f if f.eq_ignore_ascii_case("csv") => export_csv(&shard, output, err),
        f if f.eq_ignore_ascii_case("json") => export_json(&shard, output, err),
        f if f.eq_ignore_ascii_case("sqlite") => export_sqlite(&shard, output, err),
        _ => Err(CliError::InvalidInput(format!(
            "Unsupported format: {}",
            format
        ))),
    }
}

fn hero_net(stored: &StoredHand) -> Option<Money> {
    stored
        .hand
        .hero
        .as_deref()
        .map(|hero| stored.hand.net_result(hero))
}

/// Quotes a CSV field when it carries a delimiter or quote.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn export_csv(shard: &UserShard, output: &str, err: &mut dyn Write) -> Result<(), CliError> {
    crate::io_utils::ensure_parent_dir(std::path::Path::new(output)).map_err(|e| {
        let _ = ui::write_error(err, &e);
        CliError::Config(e)
    })?;
    let mut w = std::fs::File::create(output)
        .map(std::io::BufWriter::new)
        .map_err(|e| {
            let _ = ui::write_error(err, &format!("Failed to write {}: {}", output, e));
            CliError::Io(e)
        })?;
    writeln!(
        w,
        "key,platform,hand_no,played_at,game,stakes,table,hero,total_pot,rake,net,included"
    )?;
    for (key, stored) in &shard.hands {
        let h = &stored.hand;
        writeln!(
            w,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(key.as_str()),
            h.platform,
            csv_field(h.hand_no.as_deref().unwrap_or("")),
            h.played_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            h.game.as_str(),
            h.stakes.label(),
            csv_field(&h.table),
            csv_field(h.hero.as_deref().unwrap_or("")),
            h.total_pot.map(|m| m.to_string()).unwrap_or_default(),
            h.rake.map(|m| m.to_string()).unwrap_or_default(),
            hero_net(stored).map(|m| m.to_string()).unwrap_or_default(),
            stored.included_in_stats()
        )?;
    }
    Ok(())
}

fn export_json(shard: &UserShard, output: &str, err: &mut dyn Write) -> Result<(), CliError> {
    let hands: Vec<&StoredHand> = shard.hands.values().collect();
    let s = serde_json::to_string_pretty(&hands).map_err(|e| {
        let _ = ui::write_error(err, &format!("Failed to serialize JSON: {}", e));
        CliError::Core(format!("Failed to serialize JSON: {}", e))
    })?;
    crate::io_utils::ensure_parent_dir(std::path::Path::new(output)).map_err(|e| {
        let _ = ui::write_error(err, &e);
        CliError::Config(e)
    })?;
    std::fs::write(output, s).map_err(|e| {
        let _ = ui::write_error(err, &format!("Failed to write {}: {}", output, e));
        CliError::Io(e)
    })?;
    Ok(())
}

fn export_sqlite(shard: &UserShard, output: &str, err: &mut dyn Write) -> Result<(), CliError> {
    enum ExportAttemptError {
        Busy(String),
        Fatal(String),
    }

    fn sqlite_busy(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(info, _)
                if matches!(
                    info.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
        )
    }

    fn classify(e: rusqlite::Error, what: &str) -> ExportAttemptError {
        if sqlite_busy(&e) {
            ExportAttemptError::Busy(format!("{}: {}", what, e))
        } else {
            ExportAttemptError::Fatal(format!("Failed to {}: {}", what, e))
        }
    }

    fn export_sqlite_attempt(shard: &UserShard, output: &str) -> Result<(), ExportAttemptError> {
        crate::io_utils::ensure_parent_dir(std::path::Path::new(output))
            .map_err(ExportAttemptError::Fatal)?;

        let mut conn = rusqlite::Connection::open(output)
            .map_err(|e| classify(e, &format!("open {}", output)))?;
        let tx = conn
            .transaction()
            .map_err(|e| classify(e, "start transaction"))?;

        tx.execute("DROP TABLE IF EXISTS hands", [])
            .map_err(|e| classify(e, "reset schema"))?;
        tx.execute(
            "CREATE TABLE hands (
                key TEXT NOT NULL PRIMARY KEY,
                platform TEXT NOT NULL,
                hand_no TEXT,
                played_at TEXT,
                game TEXT NOT NULL,
                stakes TEXT NOT NULL,
                table_name TEXT NOT NULL,
                hero TEXT,
                total_pot_cents INTEGER,
                rake_cents INTEGER,
                net_cents INTEGER,
                included INTEGER NOT NULL,
                raw_json TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| classify(e, "create schema"))?;

        let mut stmt = tx
            .prepare(
                "INSERT INTO hands (key, platform, hand_no, played_at, game, stakes,
                    table_name, hero, total_pot_cents, rake_cents, net_cents, included, raw_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )
            .map_err(|e| classify(e, "prepare insert"))?;

        for (key, stored) in &shard.hands {
            let h = &stored.hand;
            let raw_json = serde_json::to_string(stored).map_err(|e| {
                ExportAttemptError::Fatal(format!("Failed to serialize record: {}", e))
            })?;
            stmt.execute(rusqlite::params![
                key.as_str(),
                h.platform.as_str(),
                h.hand_no.as_deref(),
                h.played_at.map(|t| t.to_rfc3339()),
                h.game.as_str(),
                h.stakes.label(),
                &h.table,
                h.hero.as_deref(),
                h.total_pot.map(|m| m.cents()),
                h.rake.map(|m| m.cents()),
                hero_net(stored).map(|m| m.cents()),
                stored.included_in_stats() as i64,
                raw_json
            ])
            .map_err(|e| classify(e, &format!("insert record {}", key)))?;
        }

        drop(stmt);
        tx.commit().map_err(|e| classify(e, "commit export"))?;
        Ok(())
    }

    let backoff_ms = std::env::var("RAILBIRD_SQLITE_BACKOFF_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);
    let max_attempts = std::env::var("RAILBIRD_SQLITE_MAX_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);

    if max_attempts == 0 {
        ui::write_error(err, "RAILBIRD_SQLITE_MAX_ATTEMPTS must be >= 1 (got 0)")?;
        return Err(CliError::Config(
            "RAILBIRD_SQLITE_MAX_ATTEMPTS must be >= 1".to_string(),
        ));
    }

    for attempt in 1..=max_attempts {
        match export_sqlite_attempt(shard, output) {
            Ok(()) => return Ok(()),
            Err(ExportAttemptError::Busy(msg)) => {
                if attempt == max_attempts {
                    ui::write_error(
                        err,
                        &format!("SQLite busy after {} attempt(s): {}", attempt, msg),
                    )?;
                    return Err(CliError::Config(format!(
                        "SQLite busy after {} attempt(s): {}",
                        attempt, msg
                    )));
                }
                std::thread::sleep(std::time::Duration::from_millis(
                    backoff_ms * attempt as u64,
                ));
            }
            Err(ExportAttemptError::Fatal(msg)) => {
                ui::write_error(err, &msg)?;
                return Err(CliError::Config(msg));
            }
        }
    }

    unreachable!("export_sqlite loop should always return before this point")
}
