//! Platform detection command.
//!
//! Answers "which site produced this file" without ingesting anything, which
//! is handy when triaging a directory of unlabeled exports.

use crate::error::CliError;
use crate::io_utils::read_text_auto;
use railbird_core::detect::detect_platform;
use std::io::Write;

/// Handles the detect command: prints the detected platform name.
pub fn handle_detect_command(input: &str, out: &mut dyn Write) -> Result<(), CliError> {
    let text = read_text_auto(input).map_err(|e| {
        CliError::Config(format!("Failed to read {}: {}", input, e))
    })?;
    let platform = detect_platform(&text)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;
    writeln!(out, "{}", platform)?;
    Ok(())
}
