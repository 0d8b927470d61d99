//! Command-line argument definitions.
//!
//! All clap types live here so the dispatch logic in [`crate::run`] and the
//! tests can share them.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for the railbird binary.
#[derive(Parser, Debug)]
#[command(
    name = "railbird",
    version,
    about = "Poker hand history ingestion, deduplication and statistics"
)]
pub struct RailbirdCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest one or more hand history files into a user's store
    Ingest {
        /// User the uploads belong to (falls back to configuration)
        #[arg(long)]
        user: Option<String>,
        /// Store directory (falls back to configuration)
        #[arg(long)]
        store: Option<String>,
        /// Hand history files to ingest (.txt or .txt.zst)
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Show statistics for a user's stored hands
    Stats {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        store: Option<String>,
        /// Restrict to one stakes level, e.g. "0.25/0.50"
        #[arg(long)]
        stakes: Option<String>,
        /// Restrict to one game: nlhe, lhe or plo
        #[arg(long)]
        game: Option<String>,
        /// Restrict to one position: button, cutoff, sb, bb, early, middle
        #[arg(long)]
        position: Option<String>,
        /// Earliest hand date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest hand date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Emit the snapshot as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Detect which platform produced a hand history file
    Detect {
        /// Hand history file to inspect
        input: String,
    },
    /// Export a user's stored hands to CSV, JSON or SQLite
    Export {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        store: Option<String>,
        /// Output format: csv, json or sqlite
        #[arg(long)]
        format: String,
        /// Output file path
        #[arg(long)]
        output: String,
    },
    /// Display current configuration settings and their sources
    Cfg,
}
