//! Engine settings.

use serde::{Deserialize, Serialize};

/// Default chrono pattern for displaying and parsing dates.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// How the option list is presented relative to widget activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsStyle {
    /// Always shown.
    Visible,
    /// Shown only while the widget is active.
    #[default]
    HideInactive,
    /// Always shown, dimmed while the widget is inactive.
    ShadowInactive,
}

/// Resolved presentation of the option list at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionListPresentation {
    Shown,
    Hidden,
    Shadowed,
}

impl OptionsStyle {
    pub fn presentation(self, active: bool) -> OptionListPresentation {
        match (self, active) {
            (OptionsStyle::Visible, _) | (_, true) => OptionListPresentation::Shown,
            (OptionsStyle::HideInactive, false) => OptionListPresentation::Hidden,
            (OptionsStyle::ShadowInactive, false) => OptionListPresentation::Shadowed,
        }
    }
}

/// Engine configuration, typically read from the `[engine]` table of a
/// config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub options_style: OptionsStyle,

    /// chrono pattern handed to the date adapter.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            options_style: OptionsStyle::default(),
            date_format: default_date_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.options_style, OptionsStyle::HideInactive);
        assert_eq!(config.date_format, "%d/%m/%Y");
    }

    #[test]
    fn test_engine_config_from_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
options_style = "shadow_inactive"
date_format = "%Y-%m-%d"
"#,
        )
        .unwrap();
        assert_eq!(config.options_style, OptionsStyle::ShadowInactive);
        assert_eq!(config.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_presentation() {
        use OptionListPresentation::*;
        assert_eq!(OptionsStyle::Visible.presentation(false), Shown);
        assert_eq!(OptionsStyle::HideInactive.presentation(false), Hidden);
        assert_eq!(OptionsStyle::HideInactive.presentation(true), Shown);
        assert_eq!(OptionsStyle::ShadowInactive.presentation(false), Shadowed);
    }
}
