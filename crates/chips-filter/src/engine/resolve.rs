//! Matching typed text to a selectable option.

use tracing::trace;

use super::FilterEngine;
use crate::item::DraftOption;
use crate::option::OptionRef;

/// Finds the option a user meant by `text`.
///
/// Titles and text are compared trimmed and case-folded. An exact title match
/// wins over any prefix match. Among prefix matches the lowest `order` wins,
/// options with an order rank before those without, and ties keep catalog
/// order. With no match at all the first option is returned. Returns `None`
/// only when `options` is empty.
pub fn match_option(options: &[OptionRef], text: &str) -> Option<OptionRef> {
    let text = text.trim().to_uppercase();
    let mut prefix: Option<&OptionRef> = None;

    if !text.is_empty() {
        for option in options {
            let title = option.title.trim().to_uppercase();
            if title == text {
                return Some(option.clone());
            }
            if title.starts_with(&text)
                && prefix.is_none_or(|p| precedence(option) < precedence(p))
            {
                prefix = Some(option);
            }
        }
    }

    prefix.or_else(|| options.first()).cloned()
}

fn precedence(option: &OptionRef) -> (bool, Option<i32>) {
    (option.order.is_none(), option.order)
}

impl FilterEngine {
    /// Resolves the draft's option reference.
    ///
    /// A resolved reference is returned as is. Free text yields `None` when
    /// `coerce` is false; otherwise it is matched against the filtered options
    /// and the draft is updated with the result.
    pub fn resolve_option(&mut self, coerce: bool) -> Option<OptionRef> {
        match &self.draft.option {
            None => None,
            Some(DraftOption::Resolved(option)) => Some(option.clone()),
            Some(DraftOption::Unresolved(_)) if !coerce => None,
            Some(DraftOption::Unresolved(text)) => {
                let matched = match_option(&self.filtered, text);
                trace!(
                    text = %text,
                    matched = matched.as_ref().map(|o| o.title.as_str()),
                    "resolved option text"
                );
                self.draft.option = matched.clone().map(DraftOption::Resolved);
                matched
            }
        }
    }
}
