//! Filter option descriptors and their behavior hooks.
//!
//! An option is supplied once by the host and never mutated afterwards. Items
//! and drafts hold an [`OptionRef`] into the shared catalog; two references
//! denote the same option only when they point at the same allocation (see
//! [`same_option`]).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;
use crate::value::{Converted, Qualifier, Value};

/// Shared handle to a catalog option.
pub type OptionRef = Arc<FilterOption>;

/// Returns true when both references denote the same catalog entry.
pub fn same_option(a: &OptionRef, b: &OptionRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Returns true when `options` contains `option` by identity.
pub fn contains_option(options: &[OptionRef], option: &OptionRef) -> bool {
    options.iter().any(|o| same_option(o, option))
}

/// Position of `option` in `options` by identity.
pub fn position_of(options: &[OptionRef], option: &OptionRef) -> Option<usize> {
    options.iter().position(|o| same_option(o, option))
}

/// The declared value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    String,
    Integer,
    Decimal,
    Date,
    Tag,
}

/// Display formatting override.
pub trait ValueFormatter: Send + Sync {
    /// Formats `value`; `detailed` asks for the `"<title>: "` prefix.
    fn format(&self, option: &FilterOption, value: Option<&Value>, detailed: bool) -> String;
}

/// Raw-to-typed conversion override. Never called with a missing value.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, option: &FilterOption, raw: &Value) -> Converted;
}

/// Asynchronous semantic validation override.
///
/// When present it replaces conversion and candidate lookup during
/// validation; its result is used verbatim.
#[async_trait]
pub trait ValueValidator: Send + Sync {
    async fn validate(&self, raw: &Value) -> Option<ValidationError>;
}

/// Asynchronous lookup of the allowed candidates for an input fragment.
#[async_trait]
pub trait ValueSource: Send + Sync {
    async fn candidates(&self, value: Option<&Value>) -> Vec<Value>;
}

/// A declarative descriptor of one selectable filter criterion.
#[derive(Clone)]
pub struct FilterOption {
    pub name: Option<String>,
    pub title: String,
    pub kind: OptionType,
    /// Options sharing a group are added and removed together.
    pub group: Option<String>,
    /// Options sharing an alternative are mutually exclusive variants.
    pub alternative: Option<String>,
    pub required: bool,
    pub readonly: bool,
    pub allow_multiple: bool,
    pub pattern: Option<Regex>,
    pub qualifiers: Vec<Qualifier>,
    /// Precedence among options whose titles match typed text equally well.
    pub order: Option<i32>,
    /// Candidate lookup used for validation and value suggestions.
    pub values: Option<Arc<dyn ValueSource>>,
    pub formatter: Option<Arc<dyn ValueFormatter>>,
    pub converter: Option<Arc<dyn ValueConverter>>,
    pub validator: Option<Arc<dyn ValueValidator>>,
}

impl fmt::Debug for FilterOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOption")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("group", &self.group)
            .field("alternative", &self.alternative)
            .field("required", &self.required)
            .field("readonly", &self.readonly)
            .field("allow_multiple", &self.allow_multiple)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("qualifiers", &self.qualifiers)
            .field("order", &self.order)
            .field("values", &self.values.is_some())
            .field("formatter", &self.formatter.is_some())
            .field("converter", &self.converter.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl FilterOption {
    /// Creates an option with the given title and type and no flags set.
    pub fn new(title: impl Into<String>, kind: OptionType) -> Self {
        Self {
            name: None,
            title: title.into(),
            kind,
            group: None,
            alternative: None,
            required: false,
            readonly: false,
            allow_multiple: false,
            pattern: None,
            qualifiers: Vec::new(),
            order: None,
            values: None,
            formatter: None,
            converter: None,
            validator: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn alternative_of(mut self, alternative: impl Into<String>) -> Self {
        self.alternative = Some(alternative.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_qualifiers(mut self, qualifiers: Vec<Qualifier>) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_values(mut self, values: Arc<dyn ValueSource>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ValueValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Wraps the option into a shared catalog reference.
    pub fn shared(self) -> OptionRef {
        Arc::new(self)
    }

    pub fn is_tag(&self) -> bool {
        self.kind == OptionType::Tag
    }

    /// Returns true when both options carry the same non-empty group.
    pub fn shares_group(&self, other: &FilterOption) -> bool {
        self.group.is_some() && self.group == other.group
    }

    /// Returns true when both options carry the same non-empty alternative.
    pub fn shares_alternative(&self, other: &FilterOption) -> bool {
        self.alternative.is_some() && self.alternative == other.alternative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_by_allocation() {
        let a = FilterOption::new("Branch", OptionType::Integer).shared();
        let b = FilterOption::new("Branch", OptionType::Integer).shared();
        let a2 = Arc::clone(&a);

        assert!(same_option(&a, &a2));
        assert!(!same_option(&a, &b));
        assert_eq!(position_of(&[b.clone(), a.clone()], &a), Some(1));
        assert!(!contains_option(&[b], &a));
    }

    #[test]
    fn test_shares_group_ignores_missing_groups() {
        let a = FilterOption::new("A", OptionType::Date);
        let b = FilterOption::new("B", OptionType::Date);
        assert!(!a.shares_group(&b));

        let a = a.in_group("range");
        let b = b.in_group("range");
        assert!(a.shares_group(&b));
    }

    #[test]
    fn test_option_type_serde_lowercase() {
        let kind: OptionType = serde_json::from_str("\"decimal\"").unwrap();
        assert_eq!(kind, OptionType::Decimal);
        assert_eq!(serde_json::to_string(&OptionType::Tag).unwrap(), "\"tag\"");
    }
}
