//! Raw-to-typed conversion and display formatting.

use std::fmt::Write;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::option::{FilterOption, OptionType};
use crate::value::{Converted, Value};

/// ISO date pattern used as a parse fallback.
const ISO_DATE: &str = "%Y-%m-%d";

/// Date formatting collaborator.
pub trait DateAdapter: Send + Sync {
    /// Formats `date` for display using `pattern`.
    fn format(&self, date: &NaiveDate, pattern: &str) -> String;

    /// Parses user-typed text, returning `None` when it is not a date.
    fn parse(&self, text: &str, pattern: &str) -> Option<NaiveDate>;
}

/// [`DateAdapter`] backed by chrono's strftime patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDateAdapter;

impl DateAdapter for ChronoDateAdapter {
    fn format(&self, date: &NaiveDate, pattern: &str) -> String {
        let mut text = String::new();
        if write!(text, "{}", date.format(pattern)).is_err() {
            return date.format(ISO_DATE).to_string();
        }
        text
    }

    fn parse(&self, text: &str, pattern: &str) -> Option<NaiveDate> {
        let text = text.trim();
        NaiveDate::parse_from_str(text, pattern)
            .or_else(|_| NaiveDate::parse_from_str(text, ISO_DATE))
            .ok()
    }
}

/// The date adapter together with the display pattern handed to it.
#[derive(Clone)]
pub struct DateContext {
    pub adapter: Option<Arc<dyn DateAdapter>>,
    pub pattern: String,
}

impl DateContext {
    pub fn new(adapter: Option<Arc<dyn DateAdapter>>, pattern: impl Into<String>) -> Self {
        Self {
            adapter,
            pattern: pattern.into(),
        }
    }
}

impl Default for DateContext {
    fn default() -> Self {
        Self::new(Some(Arc::new(ChronoDateAdapter)), "%d/%m/%Y")
    }
}

impl std::fmt::Debug for DateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateContext")
            .field("adapter", &self.adapter.is_some())
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Converts a raw draft value to the option's declared type.
///
/// A missing raw value stays [`Converted::Empty`]. An option-level converter
/// takes precedence over the built-in rules; numeric parse failures yield
/// [`Converted::Invalid`].
pub fn convert(option: &FilterOption, raw: Option<&Value>, dates: &DateContext) -> Converted {
    let Some(raw) = raw else {
        return Converted::Empty;
    };

    if let Some(converter) = &option.converter {
        return converter.convert(option, raw);
    }

    match option.kind {
        OptionType::Integer => match raw {
            Value::Integer(n) => Converted::Value(Value::Integer(*n)),
            Value::Decimal(n) if n.is_finite() => Converted::Value(Value::Integer(n.trunc() as i64)),
            Value::Text(text) => parse_integer(text)
                .map(|n| Converted::Value(Value::Integer(n)))
                .unwrap_or(Converted::Invalid),
            _ => Converted::Invalid,
        },
        OptionType::Decimal => match raw {
            Value::Integer(n) => Converted::Value(Value::Decimal(*n as f64)),
            Value::Decimal(n) => Converted::Value(Value::Decimal(*n)),
            Value::Text(text) => parse_decimal(text)
                .map(|n| Converted::Value(Value::Decimal(n)))
                .unwrap_or(Converted::Invalid),
            _ => Converted::Invalid,
        },
        OptionType::Date => match raw {
            Value::Text(text) if text.trim().is_empty() => Converted::Empty,
            Value::Text(text) => {
                let parsed = match &dates.adapter {
                    Some(adapter) => adapter.parse(text, &dates.pattern),
                    None => NaiveDate::parse_from_str(text.trim(), ISO_DATE).ok(),
                };
                parsed
                    .map(|d| Converted::Value(Value::Date(d)))
                    .unwrap_or(Converted::Invalid)
            }
            other => Converted::Value(other.clone()),
        },
        OptionType::String | OptionType::Tag => Converted::Value(raw.clone()),
    }
}

/// Formats a value for display, optionally prefixed with the option title.
pub fn format(
    option: &FilterOption,
    value: Option<&Value>,
    detailed: bool,
    dates: &DateContext,
) -> String {
    if let Some(formatter) = &option.formatter {
        return formatter.format(option, value, detailed);
    }

    let text = match (value, &dates.adapter) {
        (Some(Value::Date(date)), Some(adapter)) if option.kind == OptionType::Date => {
            adapter.format(date, &dates.pattern)
        }
        (Some(value), _) => value.to_string(),
        (None, _) => String::new(),
    };

    if detailed {
        format!("{}: {}", option.title, text)
    } else {
        text
    }
}

/// Parses a leading base-10 integer, ignoring trailing garbage.
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['+', '-']));
    let digits_len = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits_len == 0 {
        return None;
    }
    text[..digits_start + digits_len].parse().ok()
}

/// Parses a leading float literal after dropping whitespace and thousands
/// separators.
fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let bytes = cleaned.as_bytes();

    let mut end = usize::from(cleaned.starts_with(['+', '-']));
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    cleaned[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
