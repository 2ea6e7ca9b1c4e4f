//! Catalog output formatting.

use chips_filter_rs::{Catalog, FilterOption, OptionType};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON output structure for the check command.
#[derive(Serialize)]
pub struct CatalogOutput<'a> {
    pub options: Vec<OptionOutput<'a>>,
    pub items: usize,
}

/// JSON output structure for a single option.
#[derive(Serialize)]
pub struct OptionOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub title: &'a str,
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<&'a str>,
    pub flags: Vec<&'static str>,
}

/// The boolean traits of an option, as short labels.
fn option_flags(option: &FilterOption) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if option.required {
        flags.push("required");
    }
    if option.readonly {
        flags.push("readonly");
    }
    if option.allow_multiple {
        flags.push("multiple");
    }
    if option.pattern.is_some() {
        flags.push("pattern");
    }
    if option.values.is_some() {
        flags.push("values");
    }
    flags
}

fn type_name(kind: OptionType) -> &'static str {
    match kind {
        OptionType::String => "string",
        OptionType::Integer => "integer",
        OptionType::Decimal => "decimal",
        OptionType::Date => "date",
        OptionType::Tag => "tag",
    }
}

/// Formats a catalog as JSON.
pub fn format_catalog_json(catalog: &Catalog) -> Result<String, serde_json::Error> {
    let options = catalog
        .options
        .iter()
        .map(|o| OptionOutput {
            name: o.name.as_deref(),
            title: &o.title,
            kind: o.kind,
            group: o.group.as_deref(),
            alternative: o.alternative.as_deref(),
            flags: option_flags(o),
        })
        .collect();

    serde_json::to_string_pretty(&CatalogOutput {
        options,
        items: catalog.items.len(),
    })
}

/// Formats a catalog as a table.
pub fn format_catalog_table(catalog: &Catalog, use_colors: bool) -> String {
    if catalog.options.is_empty() {
        return "No options found.\n".to_string();
    }

    let mut output = String::new();

    let header = format!(
        "{:<16} {:<20} {:<8} {:<12} {}",
        "Name", "Title", "Type", "Group", "Flags"
    );
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for option in &catalog.options {
        let group = match (&option.group, &option.alternative) {
            (Some(group), Some(alt)) => format!("{group}/{alt}"),
            (Some(group), None) => group.clone(),
            (None, Some(alt)) => format!("/{alt}"),
            (None, None) => String::new(),
        };
        let line = format!(
            "{:<16} {:<20} {:<8} {:<12} {}",
            option.name.as_deref().unwrap_or("-"),
            option.title,
            type_name(option.kind),
            group,
            option_flags(option).join(",")
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    if !catalog.items.is_empty() {
        output.push_str(&format!("\n{} initial item(s)\n", catalog.items.len()));
    }

    output
}
