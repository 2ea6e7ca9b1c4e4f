//! Typed filter values and chip qualifiers.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A typed value carried by a draft or a committed item.
///
/// Deserialization is untagged so catalog files can write plain literals
/// (`680`, `12.5`, `true`, `"2024-01-31"`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    /// Creates a text value.
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    /// Truthiness used to infer tag qualifiers from stored values.
    ///
    /// `false`, `0`, `0.0`, NaN and the empty string are falsy; everything
    /// else (including any date) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Decimal(n) => *n != 0.0 && !n.is_nan(),
            Value::Date(_) => true,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Result of converting a raw value against an option's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    /// No value was given.
    Empty,
    /// A value was given but could not be converted.
    Invalid,
    /// The converted, typed value.
    Value(Value),
}

impl Converted {
    /// Returns the converted value, treating both `Empty` and `Invalid` as absent.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Converted::Value(v) => Some(v),
            Converted::Empty | Converted::Invalid => None,
        }
    }

    /// Returns true for `Empty` and `Invalid`.
    pub fn is_absent(&self) -> bool {
        !matches!(self, Converted::Value(_))
    }
}

/// A cyclable chip modifier, e.g. a sort direction or a tag's checked state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    /// Icon name shown on the chip; `None` renders no icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// The value this qualifier stands for.
    pub value: Value,
}

impl Qualifier {
    /// Creates a qualifier.
    pub fn new(icon: Option<&str>, value: impl Into<Value>) -> Self {
        Self {
            icon: icon.map(str::to_string),
            value: value.into(),
        }
    }
}

/// The built-in qualifier pair used by tag options: checked, then unchecked.
pub fn tag_qualifiers() -> [Qualifier; 2] {
    [
        Qualifier::new(Some("check"), true),
        Qualifier::new(None, false),
    ]
}

/// Picks the tag qualifier matching a stored value's truthiness.
pub fn tag_qualifier_for(value: Option<&Value>) -> Qualifier {
    let [checked, unchecked] = tag_qualifiers();
    if value.is_some_and(Value::is_truthy) {
        checked
    } else {
        unchecked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-3).is_truthy());
        assert!(!Value::Decimal(f64::NAN).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(Value::text("x").is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Decimal(1234.5).to_string(), "1234.5");
        assert_eq!(Value::Decimal(3.0).to_string(), "3");
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).to_string(),
            "2024-01-05"
        );
    }

    #[test]
    fn test_untagged_deserialize() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 680, 12.5, "2024-01-31", "abc"]"#).unwrap();
        assert_eq!(values[0], Value::Bool(true));
        assert_eq!(values[1], Value::Integer(680));
        assert_eq!(values[2], Value::Decimal(12.5));
        assert_eq!(
            values[3],
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert_eq!(values[4], Value::text("abc"));
    }

    #[test]
    fn test_tag_qualifier_for() {
        assert_eq!(tag_qualifier_for(Some(&Value::Bool(true))).value, Value::Bool(true));
        assert_eq!(tag_qualifier_for(Some(&Value::Bool(false))).value, Value::Bool(false));
        assert_eq!(tag_qualifier_for(None).value, Value::Bool(false));
    }
}
