use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::{CommandContext, CommandError};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "CHIPS_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Installs the stderr subscriber; `CHIPS_LOG` wins over the flags.
fn setup_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    match &cli.command {
        Some(Commands::Run { catalog, script }) => {
            commands::run::execute(&ctx, catalog.as_deref(), script.as_deref()).await
        }
        Some(Commands::Check { catalog }) => commands::check::execute(&ctx, catalog),
        Some(Commands::Config { command }) => dispatch_config(&ctx, command),
        None => {
            if !ctx.quiet {
                println!("chips - chips filter sessions");
                println!("Use --help for usage information");
            }
            Ok(())
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> commands::Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Catalog(_) => "CATALOG_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Script { .. } => "SCRIPT_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Script { .. } | CommandError::Json(_) => ExitCode::from(1),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Catalog(_) => ExitCode::from(4),
        CommandError::Config(_) => ExitCode::from(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chips_filter_rs::CatalogError;

    #[test]
    fn test_error_codes() {
        let err = CommandError::Catalog(CatalogError::duplicate_name("branch"));
        assert_eq!(error_code(&err), "CATALOG_ERROR");
        assert_eq!(error_exit_code(&err), ExitCode::from(4));

        let err = CommandError::Script {
            line: 3,
            message: "unknown command 'x'".to_string(),
        };
        assert_eq!(err.to_string(), "line 3: unknown command 'x'");
        assert_eq!(error_exit_code(&err), ExitCode::from(1));
    }
}
