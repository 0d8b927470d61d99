//! Hand history ingestion command.
//!
//! Loads the user's persisted shard, runs each input file through the core
//! ingestion pipeline and writes the shard back. Unreadable or unrecognized
//! files are reported and skipped so one bad file never sinks a batch; the
//! command fails only when every input failed.

use crate::error::CliError;
use crate::io_utils::read_text_auto;
use crate::persist;
use crate::ui;
use railbird_core::pipeline::{CancelToken, IngestionSummary, NoopProgress, Pipeline};
use std::io::Write;
use tracing::info;

/// Handles the ingest command.
///
/// # Arguments
///
/// * `user` - Owner of the uploads
/// * `store_dir` - Directory with per-user shard files
/// * `inputs` - Hand history files (.txt or .txt.zst)
/// * `out` - Output stream for per-file and total summaries
/// * `err` - Output stream for warnings about skipped files
///
/// # Returns
///
/// `Result<(), CliError>`: `Ok(())` when at least one file was processed.
pub fn handle_ingest_command(
    user: &str,
    store_dir: &str,
    inputs: &[String],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let shard = persist::load_shard(store_dir, user)?;
    let pipeline = Pipeline::new();
    pipeline.store().restore_user(user, shard)?;

    let cancel = CancelToken::new();
    let mut totals = IngestionSummary::default();
    let mut processed = 0usize;

    for input in inputs {
        let text = match read_text_auto(input) {
            Ok(t) => t,
            Err(e) => {
                ui::display_warning(err, &format!("skipping {}: {}", input, e))?;
                continue;
            }
        };
        let summary = match pipeline.ingest(user, input, text.as_bytes(), &NoopProgress, &cancel) {
            Ok(s) => s,
            Err(e) => {
                ui::display_warning(err, &format!("skipping {}: {}", input, e))?;
                continue;
            }
        };
        processed += 1;
        write_file_summary(out, input, &summary)?;
        totals.total += summary.total;
        totals.new += summary.new;
        totals.duplicates += summary.duplicates;
        totals.partial_merges += summary.partial_merges;
        totals.conflicts += summary.conflicts;
        totals.parse_errors += summary.parse_errors;
    }

    if processed == 0 {
        return Err(CliError::InvalidInput(
            "no input file could be ingested".to_string(),
        ));
    }

    let shard = pipeline.store().snapshot_user(user)?;
    persist::save_shard(store_dir, user, &shard)?;
    info!(user, files = processed, hands = shard.hands.len(), "shard saved");

    if inputs.len() > 1 {
        writeln!(
            out,
            "total: {} hands, {} new, {} duplicates, {} merged, {} conflicts, {} parse errors",
            totals.total,
            totals.new,
            totals.duplicates,
            totals.partial_merges,
            totals.conflicts,
            totals.parse_errors
        )?;
    }
    Ok(())
}

fn write_file_summary(
    out: &mut dyn Write,
    input: &str,
    summary: &IngestionSummary,
) -> Result<(), CliError> {
    if summary.whole_file_duplicate {
        writeln!(out, "{}: already ingested ({} hands)", input, summary.total)?;
        return Ok(());
    }
    writeln!(
        out,
        "{}: {} hands, {} new, {} duplicates, {} merged, {} conflicts, {} parse errors",
        input,
        summary.total,
        summary.new,
        summary.duplicates,
        summary.partial_merges,
        summary.conflicts,
        summary.parse_errors
    )?;
    Ok(())
}
