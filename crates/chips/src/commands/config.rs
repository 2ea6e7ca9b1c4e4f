//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/chips/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use chips_filter_rs::{EngineConfig, OptionsStyle};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the full config file path.
pub const CONFIG_ENV: &str = "CHIPS_CONFIG";

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# chips - filter session configuration

# Config schema version (do not modify)
version = 1

# Catalog used by `chips run` when --catalog is not given
# default_catalog = "/path/to/catalog.toml"

[engine]
# When the option list is shown: "visible", "hide_inactive", "shadow_inactive"
options_style = "hide_inactive"
# chrono pattern for displaying and typing dates
date_format = "%d/%m/%Y"
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Catalog loaded when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_catalog: Option<PathBuf>,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            default_catalog: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/chips/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("chips"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("chips"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    Ok(get_config_dir()?.join("config.toml"))
}

/// Loads the configuration from disk, or the defaults when no file exists.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Brings a config up to the current schema version.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version < CONFIG_VERSION {
        debug!(from = config.version, to = CONFIG_VERSION, "migrating config");
    }
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;
    ensure_parent_dir(&path)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        println!("Settings:");
        match &config.default_catalog {
            Some(catalog) => println!("  default_catalog: {}", catalog.display()),
            None => println!("  default_catalog: (none)"),
        }

        println!("\n[engine]");
        println!("  options_style: {}", style_name(config.engine.options_style));
        println!("  date_format: {}", config.engine.date_format);

        if !path.exists() {
            println!("\n(No config file exists. Run 'chips config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    ensure_parent_dir(&path)?;
    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "created",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": get_config_path()?.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Applies one `key = value` setting to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "default_catalog" => {
            config.default_catalog = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        "engine.options_style" => {
            config.engine.options_style = parse_style(value)?;
        }
        "engine.date_format" => {
            if value.trim().is_empty() {
                return Err(CommandError::Config(
                    "date_format must not be empty".to_string(),
                ));
            }
            config.engine.date_format = value.to_string();
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: default_catalog, engine.options_style, engine.date_format",
                key
            )));
        }
    }
    Ok(())
}

/// Parses an options style name as written in the config file.
fn parse_style(s: &str) -> Result<OptionsStyle> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "visible" => Ok(OptionsStyle::Visible),
        "hide_inactive" => Ok(OptionsStyle::HideInactive),
        "shadow_inactive" => Ok(OptionsStyle::ShadowInactive),
        _ => Err(CommandError::Config(format!(
            "Invalid options_style value '{}'. Valid values: visible, hide_inactive, shadow_inactive",
            s
        ))),
    }
}

fn style_name(style: OptionsStyle) -> &'static str {
    match style {
        OptionsStyle::Visible => "visible",
        OptionsStyle::HideInactive => "hide_inactive",
        OptionsStyle::ShadowInactive => "shadow_inactive",
    }
}
