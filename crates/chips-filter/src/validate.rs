//! Asynchronous validation of the draft value and the bound value control.
//!
//! Validation requests are detached from the engine: a [`ValidationRequest`]
//! owns the option and raw value it checks, so the host can await it without
//! holding a borrow. Each request carries a sequence number; the engine only
//! applies the outcome of the most recent request.

use thiserror::Error;

use crate::convert::{convert, DateContext};
use crate::option::OptionRef;
use crate::value::{Converted, Value};

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// The raw text failed the option's pattern.
    Pattern,
    /// The value was rejected semantically.
    Value,
}

/// A validation failure surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
}

impl ValidationError {
    pub fn pattern() -> Self {
        Self {
            kind: ValidationKind::Pattern,
            message: "invalid pattern".to_string(),
        }
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Value,
            message: message.into(),
        }
    }
}

/// Validation status of the bound value control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControlStatus {
    #[default]
    Valid,
    Pending,
    Invalid(ValidationError),
}

/// State of the value input the draft value is bound to.
#[derive(Debug, Clone, Default)]
pub struct ValueControl {
    status: ControlStatus,
    pristine: bool,
    latest_request: u64,
}

impl ValueControl {
    pub fn status(&self) -> &ControlStatus {
        &self.status
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.status, ControlStatus::Invalid(_))
    }

    pub fn is_pristine(&self) -> bool {
        self.pristine
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match &self.status {
            ControlStatus::Invalid(error) => Some(error),
            _ => None,
        }
    }

    pub(crate) fn mark_pristine(&mut self) {
        self.pristine = true;
    }

    /// Marks the control dirty and pending, returning the new request number.
    pub(crate) fn begin(&mut self) -> u64 {
        self.pristine = false;
        self.latest_request += 1;
        self.status = ControlStatus::Pending;
        self.latest_request
    }

    /// Applies an outcome if it answers the latest request.
    pub(crate) fn complete(&mut self, outcome: &ValidationOutcome) -> bool {
        if outcome.sequence != self.latest_request {
            return false;
        }
        self.status = match &outcome.error {
            Some(error) => ControlStatus::Invalid(error.clone()),
            None => ControlStatus::Valid,
        };
        true
    }

    /// Drops any in-flight request and clears the status.
    pub(crate) fn reset(&mut self) {
        self.latest_request += 1;
        self.status = ControlStatus::Valid;
    }
}

/// A self-contained validation job for one raw draft value.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    sequence: u64,
    option: Option<OptionRef>,
    raw: Option<Value>,
    dates: DateContext,
}

impl ValidationRequest {
    pub(crate) fn new(
        sequence: u64,
        option: Option<OptionRef>,
        raw: Option<Value>,
        dates: DateContext,
    ) -> Self {
        Self {
            sequence,
            option,
            raw,
            dates,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Runs the validation steps and returns the stamped outcome.
    pub async fn run(self) -> ValidationOutcome {
        let error = validate_value(self.option.as_ref(), self.raw.as_ref(), &self.dates).await;
        ValidationOutcome {
            sequence: self.sequence,
            error,
        }
    }
}

/// The result of a [`ValidationRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub sequence: u64,
    pub error: Option<ValidationError>,
}

/// Validates a raw value against an option, short-circuiting at the first
/// failure.
pub async fn validate_value(
    option: Option<&OptionRef>,
    raw: Option<&Value>,
    dates: &DateContext,
) -> Option<ValidationError> {
    let (Some(option), Some(raw)) = (option, raw) else {
        return None;
    };

    if let Some(pattern) = &option.pattern {
        if !pattern.is_match(&raw.to_string()) {
            return Some(ValidationError::pattern());
        }
    }

    if let Some(validator) = &option.validator {
        return validator.validate(raw).await;
    }

    let value = match convert(option, Some(raw), dates) {
        Converted::Empty => return None,
        Converted::Invalid => return Some(ValidationError::value("invalid value")),
        Converted::Value(value) => value,
    };

    let source = option.values.as_ref()?;
    let candidates = source.candidates(Some(&value)).await;

    if candidates.len() == 1 {
        None
    } else {
        Some(ValidationError::value("invalid value"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use regex::Regex;

    use super::*;
    use crate::option::{FilterOption, OptionType, ValueSource, ValueValidator};

    struct Branches(Vec<i64>);

    #[async_trait]
    impl ValueSource for Branches {
        async fn candidates(&self, value: Option<&Value>) -> Vec<Value> {
            let needle = value.map(|v| v.to_string()).unwrap_or_default();
            self.0
                .iter()
                .filter(|b| b.to_string().contains(&needle))
                .map(|b| Value::Integer(*b))
                .collect()
        }
    }

    struct RejectAll;

    #[async_trait]
    impl ValueValidator for RejectAll {
        async fn validate(&self, _raw: &Value) -> Option<ValidationError> {
            Some(ValidationError::value("Invalid value"))
        }
    }

    fn branch() -> OptionRef {
        FilterOption::new("Branch", OptionType::Integer)
            .with_pattern(Regex::new(r"\d{3}").unwrap())
            .with_values(Arc::new(Branches(vec![172, 680])))
            .shared()
    }

    async fn check(option: &OptionRef, raw: &str) -> Option<ValidationError> {
        validate_value(Some(option), Some(&Value::text(raw)), &DateContext::default()).await
    }

    #[tokio::test]
    async fn test_missing_option_or_value_is_valid() {
        let option = branch();
        let dates = DateContext::default();
        assert!(validate_value(None, Some(&Value::text("x")), &dates).await.is_none());
        assert!(validate_value(Some(&option), None, &dates).await.is_none());
    }

    #[tokio::test]
    async fn test_pattern_failure() {
        let error = check(&branch(), "68").await.unwrap();
        assert_eq!(error.kind, ValidationKind::Pattern);
    }

    #[tokio::test]
    async fn test_single_candidate_is_valid() {
        assert!(check(&branch(), "680").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_value_error() {
        let error = check(&branch(), "999").await.unwrap();
        assert_eq!(error.kind, ValidationKind::Value);
    }

    #[tokio::test]
    async fn test_validator_replaces_remaining_steps() {
        let option = FilterOption::new("Order", OptionType::String)
            .with_validator(Arc::new(RejectAll))
            .shared();
        let error = check(&option, "anything").await.unwrap();
        assert_eq!(error.message, "Invalid value");
    }

    #[tokio::test]
    async fn test_failed_parse_is_value_error() {
        let option = FilterOption::new("Amount", OptionType::Decimal).shared();
        let error = check(&option, "lots").await.unwrap();
        assert_eq!(error.kind, ValidationKind::Value);
    }

    #[tokio::test]
    async fn test_option_without_lookup_is_valid() {
        let option = FilterOption::new("Amount", OptionType::Decimal).shared();
        assert!(check(&option, "12.5").await.is_none());
    }

    #[test]
    fn test_control_ignores_stale_outcomes() {
        let mut control = ValueControl::default();
        let first = control.begin();
        let second = control.begin();

        let stale = ValidationOutcome {
            sequence: first,
            error: Some(ValidationError::pattern()),
        };
        assert!(!control.complete(&stale));
        assert_eq!(control.status(), &ControlStatus::Pending);

        let fresh = ValidationOutcome {
            sequence: second,
            error: None,
        };
        assert!(control.complete(&fresh));
        assert_eq!(control.status(), &ControlStatus::Valid);
    }
}
