//! Value suggestions for the draft, drawn from an option's candidate lookup.
//!
//! Like validation, a [`SuggestionRequest`] is detached from the engine and
//! stamped with a sequence number, so only the answer to the latest request
//! replaces the suggestion list.

use crate::option::OptionRef;
use crate::value::Value;

/// A self-contained lookup of candidates for the typed fragment.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    sequence: u64,
    option: OptionRef,
    fragment: Option<Value>,
}

impl SuggestionRequest {
    pub(crate) fn new(sequence: u64, option: OptionRef, fragment: Option<Value>) -> Self {
        Self {
            sequence,
            option,
            fragment,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn option(&self) -> &OptionRef {
        &self.option
    }

    /// Fetches the candidates and returns the stamped outcome.
    pub async fn run(self) -> SuggestionOutcome {
        let candidates = match &self.option.values {
            Some(source) => source.candidates(self.fragment.as_ref()).await,
            None => Vec::new(),
        };
        SuggestionOutcome {
            sequence: self.sequence,
            candidates,
        }
    }
}

/// The result of a [`SuggestionRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionOutcome {
    pub sequence: u64,
    pub candidates: Vec<Value>,
}

/// The current suggestion list and the latest request it may be replaced by.
#[derive(Debug, Clone, Default)]
pub struct Suggestions {
    latest_request: u64,
    candidates: Vec<Value>,
}

impl Suggestions {
    pub fn candidates(&self) -> &[Value] {
        &self.candidates
    }

    pub(crate) fn begin(&mut self) -> u64 {
        self.latest_request += 1;
        self.latest_request
    }

    /// Applies an outcome if it answers the latest request.
    pub(crate) fn complete(&mut self, outcome: &SuggestionOutcome) -> bool {
        if outcome.sequence != self.latest_request {
            return false;
        }
        self.candidates = outcome.candidates.clone();
        true
    }

    /// Empties the list and drops any in-flight request.
    pub(crate) fn clear(&mut self) {
        self.latest_request += 1;
        self.candidates.clear();
    }
}
