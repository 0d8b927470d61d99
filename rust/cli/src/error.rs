//! Error types for the CLI application.
//!
//! This module defines the error types used throughout the CLI for better
//! error propagation and handling.

use std::fmt;

/// Custom error type for CLI operations.
///
/// This enum encompasses all error types that can occur during CLI execution,
/// allowing for proper error propagation using the `?` operator.
#[derive(Debug)]
pub enum CliError {
    /// I/O error (file operations, stdout/stderr writes, etc.)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// Error surfaced by the ingestion/statistics core
    Core(String),

    /// Operation was interrupted (e.g., by user with Ctrl+C)
    Interrupted(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Core(msg) => write!(f, "{}", msg),
            CliError::Interrupted(msg) => write!(f, "Interrupted: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

// Automatic conversion from std::io::Error to CliError
impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<railbird_core::errors::IngestError> for CliError {
    fn from(error: railbird_core::errors::IngestError) -> Self {
        CliError::Core(error.to_string())
    }
}

impl From<railbird_core::errors::StoreError> for CliError {
    fn from(error: railbird_core::errors::StoreError) -> Self {
        CliError::Core(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_variant_context() {
        let e = CliError::InvalidInput("bad --format".to_string());
        assert_eq!(e.to_string(), "Invalid input: bad --format");
        let e = CliError::Config("store dir missing".to_string());
        assert_eq!(e.to_string(), "Configuration error: store dir missing");
    }

    #[test]
    fn test_io_error_preserves_source() {
        use std::error::Error;
        let e = CliError::from(std::io::Error::other("disk gone"));
        assert!(e.source().is_some());
    }
}
