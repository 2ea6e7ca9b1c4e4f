//! Option catalogs loaded from TOML or JSON files.
//!
//! A catalog file lists option specs in display order and, optionally, the
//! initial items:
//!
//! ```toml
//! [[options]]
//! name = "branch"
//! title = "Branch"
//! type = "integer"
//! required = true
//! pattern = '\d{3}'
//! values = [172, 680]
//!
//! [[items]]
//! option = "branch"
//! value = 680
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::levenshtein;
use thiserror::Error;

use crate::item::Item;
use crate::option::{FilterOption, OptionRef, OptionType, ValueSource};
use crate::value::{Qualifier, Value};

/// Maximum Levenshtein distance to consider a name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("option '{option}' has an invalid pattern: {source}")]
    InvalidPattern {
        option: String,
        #[source]
        source: regex::Error,
    },

    #[error("option #{index} has an empty title")]
    EmptyTitle { index: usize },

    #[error("duplicate option name '{name}'")]
    DuplicateName { name: String },

    #[error("{}", unknown_option_message(.identifier, .suggestion))]
    UnknownOption {
        identifier: String,
        suggestion: Option<String>,
    },

    #[error("qualifier {value} is not declared by option '{option}'")]
    UnknownQualifier { option: String, value: String },
}

impl CatalogError {
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        CatalogError::DuplicateName { name: name.into() }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

fn unknown_option_message(identifier: &str, suggestion: &Option<String>) -> String {
    let base = format!("option '{}' not found in catalog.", identifier);
    match suggestion {
        Some(s) => format!("{} Did you mean '{}'?", base, s),
        None => base,
    }
}

/// One option as written in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub allow_multiple: bool,
    /// Regex source tested against the raw input text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    /// Static candidate list used for lookups and validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

/// One initial item as written in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Option name, or title when the option has no name.
    pub option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Value of one of the option's qualifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<Value>,
}

/// The on-disk shape of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

/// Candidate lookup over a fixed list, matching by case-folded substring.
#[derive(Debug, Clone)]
pub struct StaticValues {
    values: Vec<Value>,
}

impl StaticValues {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl ValueSource for StaticValues {
    async fn candidates(&self, value: Option<&Value>) -> Vec<Value> {
        let Some(value) = value else {
            return self.values.clone();
        };
        let needle = value.to_string().trim().to_uppercase();
        self.values
            .iter()
            .filter(|candidate| candidate.to_string().trim().to_uppercase().contains(&needle))
            .cloned()
            .collect()
    }
}

/// A loaded catalog: shared options in display order plus initial items.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub options: Vec<OptionRef>,
    pub items: Vec<Item>,
}

impl Catalog {
    /// Loads a catalog file; `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn from_path(path: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    pub fn from_toml(content: &str) -> CatalogResult<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::build(file)
    }

    pub fn from_json(content: &str) -> CatalogResult<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::build(file)
    }

    /// Validates specs and builds the shared catalog.
    pub fn build(file: CatalogFile) -> CatalogResult<Self> {
        let mut names = HashSet::new();
        let mut options = Vec::with_capacity(file.options.len());

        for (index, spec) in file.options.into_iter().enumerate() {
            if spec.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle { index });
            }
            if let Some(name) = spec.name.as_deref().filter(|n| !n.is_empty()) {
                if !names.insert(name.to_string()) {
                    return Err(CatalogError::duplicate_name(name));
                }
            }
            options.push(build_option(spec)?.shared());
        }

        let items = file
            .items
            .into_iter()
            .map(|spec| build_item(&options, spec))
            .collect::<CatalogResult<Vec<_>>>()?;

        Ok(Self { options, items })
    }

    /// Finds an option by name, falling back to a case-insensitive title
    /// match.
    pub fn find(&self, identifier: &str) -> Option<&OptionRef> {
        find_option(&self.options, identifier)
    }
}

fn build_option(spec: OptionSpec) -> CatalogResult<FilterOption> {
    let pattern = spec
        .pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|source| CatalogError::InvalidPattern {
            option: spec.name.clone().unwrap_or_else(|| spec.title.clone()),
            source,
        })?;

    let mut option = FilterOption::new(spec.title, spec.kind).with_qualifiers(spec.qualifiers);
    option.name = spec.name;
    option.group = spec.group;
    option.alternative = spec.alternative;
    option.required = spec.required;
    option.readonly = spec.readonly;
    option.allow_multiple = spec.allow_multiple;
    option.pattern = pattern;
    option.order = spec.order;

    if let Some(values) = spec.values {
        option.values = Some(Arc::new(StaticValues::new(values)));
    }

    Ok(option)
}

fn build_item(options: &[OptionRef], spec: ItemSpec) -> CatalogResult<Item> {
    let option = find_option(options, &spec.option)
        .cloned()
        .ok_or_else(|| CatalogError::UnknownOption {
            suggestion: find_similar_name(
                &spec.option,
                options
                    .iter()
                    .flat_map(|o| o.name.as_deref().into_iter().chain([o.title.as_str()])),
            ),
            identifier: spec.option.clone(),
        })?;

    let qualifier = match spec.qualifier {
        None => option.qualifiers.first().cloned(),
        Some(value) => Some(
            option
                .qualifiers
                .iter()
                .find(|q| q.value == value)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownQualifier {
                    option: spec.option.clone(),
                    value: value.to_string(),
                })?,
        ),
    };

    Ok(Item::new(option, spec.value).with_qualifier(qualifier))
}

fn find_option<'a>(options: &'a [OptionRef], identifier: &str) -> Option<&'a OptionRef> {
    let wanted = identifier.trim().to_lowercase();
    options
        .iter()
        .find(|o| o.name.as_deref() == Some(identifier))
        .or_else(|| {
            options
                .iter()
                .find(|o| o.title.trim().to_lowercase() == wanted)
        })
}

/// Finds the closest candidate within [`MAX_SUGGESTION_DISTANCE`] edits.
fn find_similar_name<'a>(
    query: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let query_lower = query.to_lowercase();

    let (best_match, best_distance) = candidates
        .filter(|name| !name.is_empty())
        .map(|name| (name.to_string(), levenshtein(&query_lower, &name.to_lowercase())))
        .min_by_key(|(_, d)| *d)?;

    if best_distance > 0 && best_distance <= MAX_SUGGESTION_DISTANCE {
        Some(best_match)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[options]]
name = "report"
title = "Report"
type = "integer"
readonly = true

[[options]]
name = "branch"
title = "Branch"
type = "integer"
required = true
pattern = '\d{3}'
values = [172, 680]

[[options]]
name = "date.from"
title = "Date from"
type = "date"
group = "date.range"
alternative = "date"

[[options]]
name = "order"
title = "Order"
type = "string"
qualifiers = [
  { icon = "arrow_upward", value = "ascending" },
  { icon = "arrow_downward", value = "descending" },
]

[[items]]
option = "report"
value = 1203001

[[items]]
option = "order"
value = "Amount"
qualifier = "descending"
"#;

    #[test]
    fn test_load_sample_catalog() {
        let catalog = Catalog::from_toml(SAMPLE).unwrap();

        assert_eq!(catalog.options.len(), 4);
        let branch = catalog.find("branch").unwrap();
        assert!(branch.required);
        assert!(branch.pattern.as_ref().unwrap().is_match("680"));
        assert!(branch.values.is_some());

        let from = catalog.find("Date FROM").unwrap();
        assert_eq!(from.group.as_deref(), Some("date.range"));

        assert_eq!(catalog.items.len(), 2);
        assert_eq!(catalog.items[0].value, Some(Value::Integer(1203001)));
        assert_eq!(
            catalog.items[1].qualifier.as_ref().unwrap().icon.as_deref(),
            Some("arrow_downward")
        );
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = Catalog::from_toml(
            r#"
[[options]]
name = "broken"
title = "Broken"
type = "string"
pattern = '('
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { ref option, .. } if option == "broken"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Catalog::from_toml(
            r#"
[[options]]
name = "a"
title = "A"
type = "string"

[[options]]
name = "a"
title = "B"
type = "string"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { .. }));
    }

    #[test]
    fn test_unknown_item_option_suggests_name() {
        let err = Catalog::from_toml(
            r#"
[[options]]
name = "branch"
title = "Branch"
type = "integer"

[[items]]
option = "brnch"
value = 1
"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "option 'brnch' not found in catalog. Did you mean 'branch'?"
        );
    }

    #[test]
    fn test_json_catalog() {
        let catalog = Catalog::from_json(
            r#"{"options": [{"title": "Urgent", "type": "tag", "allow_multiple": true}]}"#,
        )
        .unwrap();
        assert!(catalog.options[0].is_tag());
        assert!(catalog.options[0].allow_multiple);
    }

    #[test]
    fn test_from_path_reads_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(&path, SAMPLE).unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.options.len(), 4);

        let missing = Catalog::from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, CatalogError::Read { .. }));
    }

    #[tokio::test]
    async fn test_static_values_match_substring() {
        let source = StaticValues::new(vec![Value::Integer(172), Value::Integer(680)]);
        assert_eq!(source.candidates(Some(&Value::text("68"))).await, vec![Value::Integer(680)]);
        assert_eq!(source.candidates(Some(&Value::text("7"))).await, vec![Value::Integer(172)]);
        assert_eq!(source.candidates(None).await.len(), 2);
    }
}
