//! Committed filter items and the in-progress draft.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::ser::{Serialize, Serializer};

use crate::option::OptionRef;
use crate::value::{tag_qualifier_for, Qualifier, Value};

static NEXT_ITEM_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a committed item.
///
/// Keys survive cloning, so a host that hands back clones of the engine's
/// items keeps referring to the same chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(u64);

impl ItemKey {
    fn next() -> Self {
        ItemKey(NEXT_ITEM_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// One committed filter criterion.
#[derive(Debug, Clone)]
pub struct Item {
    key: ItemKey,
    pub option: OptionRef,
    pub value: Option<Value>,
    pub qualifier: Option<Qualifier>,
}

impl Item {
    /// Creates an item with a fresh key.
    pub fn new(option: OptionRef, value: Option<Value>) -> Self {
        Self {
            key: ItemKey::next(),
            option,
            value,
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn key(&self) -> ItemKey {
        self.key
    }

    /// Fills in a missing tag qualifier from the stored boolean value.
    pub(crate) fn backfill_tag_qualifier(&mut self) {
        if self.option.is_tag() && self.qualifier.is_none() {
            self.qualifier = Some(tag_qualifier_for(self.value.as_ref()));
        }
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct ItemView<'a> {
            option: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            value: &'a Option<Value>,
            #[serde(skip_serializing_if = "Option::is_none")]
            qualifier: Option<&'a Value>,
        }

        ItemView {
            option: &self.option.title,
            name: self.option.name.as_deref(),
            value: &self.value,
            qualifier: self.qualifier.as_ref().map(|q| &q.value),
        }
        .serialize(serializer)
    }
}

/// The draft's option reference: typed text awaiting resolution, or a
/// concrete catalog option.
#[derive(Debug, Clone)]
pub enum DraftOption {
    Unresolved(String),
    Resolved(OptionRef),
}

/// The in-progress edit buffer.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub option: Option<DraftOption>,
    pub value: Option<Value>,
    pub qualifier: Option<Qualifier>,
}

impl Draft {
    /// Returns the resolved option, if any, without attempting resolution.
    pub fn resolved(&self) -> Option<&OptionRef> {
        match &self.option {
            Some(DraftOption::Resolved(option)) => Some(option),
            _ => None,
        }
    }

    /// Copies option, value and qualifier from a committed item.
    pub(crate) fn mirror(&mut self, item: &Item) {
        self.option = Some(DraftOption::Resolved(item.option.clone()));
        self.value = item.value.clone();
        self.qualifier = item.qualifier.clone();
    }
}
