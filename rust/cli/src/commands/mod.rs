//! Command handler modules for the railbird CLI.
//!
//! Each subcommand is implemented in its own module file with a consistent
//! pattern:
//!
//! - Public handler function: `pub fn handle_COMMAND_command(...) -> Result<(), CliError>`
//! - Module-private helpers: Helper functions specific to that command
//! - Dependency injection: Output streams (`&mut dyn Write`) passed as parameters
//! - Error propagation: All errors propagated via `CliError` enum

mod cfg;
mod detect;
mod export;
mod ingest;
mod stats;

pub use cfg::handle_cfg_command;
pub use detect::handle_detect_command;
pub use export::handle_export_command;
pub use ingest::handle_ingest_command;
pub use stats::{handle_stats_command, StatsArgs};

use crate::config;
use crate::error::CliError;

/// Resolves the target user and store directory from flags, falling back to
/// the loaded configuration. The remaining configuration is returned for
/// handlers that need more than the target.
pub(crate) fn resolve_target(
    user: Option<String>,
    store: Option<String>,
) -> Result<(String, String, config::Config), CliError> {
    let cfg = config::load().map_err(|e| CliError::Config(e.to_string()))?;
    let store = store.unwrap_or_else(|| cfg.store_dir.clone());
    let user = user
        .or_else(|| cfg.user.clone())
        .ok_or_else(|| CliError::InvalidInput("no user given: pass --user or set RAILBIRD_USER".into()))?;
    Ok((user, store, cfg))
}
