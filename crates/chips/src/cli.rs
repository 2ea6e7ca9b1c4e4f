//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the chips CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chips - Drive a chips filter from the terminal
#[derive(Parser, Debug)]
#[command(name = "chips")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors and search results only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Render state and results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a filter session over a catalog
    #[command(alias = "r")]
    Run {
        /// Catalog file (TOML or JSON; default: default_catalog from config)
        #[arg(short, long, env = "CHIPS_CATALOG")]
        catalog: Option<PathBuf>,

        /// Read session commands from a file instead of stdin
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// Load a catalog and list its options
    Check {
        /// Catalog file (TOML or JSON)
        #[arg(short, long)]
        catalog: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,

    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. engine.options_style)
        key: String,

        /// Configuration value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_script() {
        let cli = Cli::try_parse_from(["chips", "--json", "run", "-c", "a.toml", "-s", "s.txt"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::Run { catalog, script }) => {
                assert_eq!(catalog, Some(PathBuf::from("a.toml")));
                assert_eq!(script, Some(PathBuf::from("s.txt")));
            }
            other => panic!("Expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["chips", "-v", "-q", "config"]).is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["chips", "config", "set", "engine.options_style", "visible"])
                .unwrap();
        if let Some(Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        }) = cli.command
        {
            assert_eq!(key, "engine.options_style");
            assert_eq!(value, "visible");
        } else {
            panic!("Expected Config Set command");
        }
    }
}
