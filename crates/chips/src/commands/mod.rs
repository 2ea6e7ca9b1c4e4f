//! Command implementations for the chips CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod check;
pub mod config;
pub mod run;

use chips_filter_rs::CatalogError;

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Catalog loading error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A session script line could not be understood.
    #[error("line {line}: {message}")]
    Script { line: usize, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}
