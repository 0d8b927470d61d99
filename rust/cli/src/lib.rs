//! # Railbird CLI Library
//!
//! This library provides the command-line interface for the railbird hand
//! history ingestion and statistics core. It exposes subcommands for
//! ingesting exports, inspecting statistics, and exporting stored hands.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line
//! arguments and executes the appropriate subcommand.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::io;
//! let args = vec!["railbird", "detect", "hands.txt"];
//! let code = railbird_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Available Subcommands
//!
//! - `ingest`: Ingest hand history files into a user's store
//! - `stats`: Show aggregate statistics for a user's stored hands
//! - `detect`: Report which platform produced a hand history file
//! - `export`: Convert stored hands to various formats (CSV, JSON, SQLite)
//! - `cfg`: Display current configuration settings

use clap::Parser;
use std::io::Write;
pub mod cli;
mod commands;
mod config;
mod error;
pub mod exit_code;
pub mod io_utils;
mod persist;
pub mod ui;

use cli::{Commands, RailbirdCli};

use commands::{
    handle_cfg_command, handle_detect_command, handle_export_command, handle_ingest_command,
    handle_stats_command, resolve_target, StatsArgs,
};

pub use error::CliError;

/// Main entry point for the CLI application.
///
/// Parses command-line arguments and dispatches to the appropriate subcommand
/// handler.
///
/// # Arguments
///
/// * `args` - Iterator over command-line arguments (typically `std::env::args()`)
/// * `out` - Output stream for normal output (typically `stdout`)
/// * `err` - Output stream for error messages (typically `stderr`)
///
/// # Returns
///
/// Exit code: `0` for success, `2` for errors, `130` for interruptions
///
/// # Example
///
/// ```
/// use std::io;
/// let args = vec!["railbird", "--help"];
/// let code = railbird_cli::run(args, &mut io::stdout(), &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const COMMANDS: &[&str] = &["ingest", "stats", "detect", "export", "cfg"];
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let parsed = RailbirdCli::try_parse_from(&argv);
    match parsed {
        Err(e) => {
            use clap::error::ErrorKind;

            // Help and version should print to stdout and exit 0
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::SUCCESS
                }
                _ => {
                    // Print clap error first
                    if writeln!(err, "{}", e).is_err()
                        || writeln!(err).is_err()
                        || writeln!(err, "Railbird Hand History CLI").is_err()
                        || writeln!(err, "Usage: railbird <command> [options]\n").is_err()
                        || writeln!(err, "Commands:").is_err()
                    {
                        return exit_code::ERROR;
                    }
                    for c in COMMANDS {
                        if writeln!(err, "  {}", c).is_err() {
                            return exit_code::ERROR;
                        }
                    }
                    if writeln!(err, "\nFor full help, run: railbird --help").is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::ERROR
                }
            }
        }
        Ok(cli) => match cli.cmd {
            Commands::Ingest {
                user,
                store,
                inputs,
            } => {
                let (user, store, _) = match resolve_target(user, store) {
                    Ok(t) => t,
                    Err(e) => return report(err, e),
                };
                match handle_ingest_command(&user, &store, &inputs, out, err) {
                    Ok(()) => exit_code::SUCCESS,
                    Err(CliError::Interrupted(_)) => exit_code::INTERRUPTED,
                    Err(e) => report(err, e),
                }
            }
            Commands::Stats {
                user,
                store,
                stakes,
                game,
                position,
                from,
                to,
                json,
            } => {
                let (user, store, cfg) = match resolve_target(user, store) {
                    Ok(t) => t,
                    Err(e) => return report(err, e),
                };
                let args = StatsArgs {
                    stakes,
                    game,
                    position,
                    from,
                    to,
                    json,
                };
                match handle_stats_command(&user, &store, cfg.cache_ttl_secs, args, out) {
                    Ok(()) => exit_code::SUCCESS,
                    Err(e) => report(err, e),
                }
            }
            Commands::Detect { input } => match handle_detect_command(&input, out) {
                Ok(()) => exit_code::SUCCESS,
                Err(e) => report(err, e),
            },
            Commands::Export {
                user,
                store,
                format,
                output,
            } => {
                let (user, store, _) = match resolve_target(user, store) {
                    Ok(t) => t,
                    Err(e) => return report(err, e),
                };
                match handle_export_command(&user, &store, &format, &output, err) {
                    Ok(()) => exit_code::SUCCESS,
                    Err(e) => report(err, e),
                }
            }
            Commands::Cfg => match handle_cfg_command(out, err) {
                Ok(()) => exit_code::SUCCESS,
                Err(e) => report(err, e),
            },
        },
    }
}

fn report(err: &mut dyn Write, e: CliError) -> i32 {
    let _ = writeln!(err, "Error: {}", e);
    exit_code::ERROR
}
