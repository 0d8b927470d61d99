//! Platform detection over raw upload text.
//!
//! Detection is a single heuristic pass over fixed-position markers unique to
//! each known export format. It never falls back to trying every parser: an
//! input matching no marker is rejected with an excerpt of the offending text.

use crate::errors::DetectError;
use crate::hand::Platform;

const EXCERPT_LEN: usize = 80;

/// Classifies raw text into a known platform format.
///
/// Leading blank lines and a UTF-8 BOM are tolerated; the first non-empty
/// line must open with one of the known header markers.
pub fn detect_platform(text: &str) -> Result<Platform, DetectError> {
    let trimmed = text.trim_start_matches('\u{feff}');
    let first = trimmed
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or(DetectError::EmptyInput)?;
    let line = first.trim_start();
    if line.starts_with("PokerStars Hand #") || line.starts_with("PokerStars Game #") {
        return Ok(Platform::Stars);
    }
    if line.starts_with("Poker Hand #") {
        return Ok(Platform::GgNet);
    }
    if line.starts_with("***** Hand History for Game ") {
        return Ok(Platform::Party);
    }
    let excerpt: String = line.chars().take(EXCERPT_LEN).collect();
    Err(DetectError::UnrecognizedFormat { excerpt })
}
