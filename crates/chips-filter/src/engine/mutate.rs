//! User-driven mutations: add, edit, remove, toggle, cancel, select.

use tracing::debug;

use super::reconcile::{group_span, span_item};
use super::{sort_items, FilterEngine};
use crate::convert::convert;
use crate::item::{DraftOption, Item, ItemKey};
use crate::option::{contains_option, position_of, same_option, FilterOption, OptionRef};
use crate::schedule::{FocusTarget, Task};
use crate::value::{tag_qualifiers, Qualifier, Value};

/// The qualifiers an option cycles through, if any.
fn qualifier_cycle(option: &FilterOption) -> Option<Vec<Qualifier>> {
    if !option.qualifiers.is_empty() {
        Some(option.qualifiers.clone())
    } else if option.is_tag() {
        Some(tag_qualifiers().to_vec())
    } else {
        None
    }
}

/// Advances `qualifier` to the next entry of the option's cycle.
fn cycle_qualifier(
    option: &FilterOption,
    qualifier: &mut Option<Qualifier>,
    value: &mut Option<Value>,
) -> bool {
    let Some(cycle) = qualifier_cycle(option) else {
        return false;
    };
    let Some(current) = qualifier.as_ref() else {
        return false;
    };
    if option.readonly {
        return false;
    }

    let next = cycle
        .iter()
        .position(|q| q == current)
        .map_or(0, |i| (i + 1) % cycle.len());
    let next = cycle[next].clone();

    if option.is_tag() {
        *value = Some(next.value.clone());
    }
    *qualifier = Some(next);
    true
}

impl FilterEngine {
    /// Clears the draft value and qualifier, applying the resolved option's
    /// defaults.
    pub fn reset_draft_value(&mut self) {
        let option = self.resolve_option(true);
        let mut qualifier = option.as_ref().and_then(|o| o.qualifiers.first().cloned());
        let mut value = None;

        if option.as_ref().is_some_and(|o| o.is_tag()) {
            let [checked, _] = tag_qualifiers();
            let tag = qualifier.get_or_insert(checked);
            value = Some(tag.value.clone());
        }

        self.draft.value = value;
        self.draft.qualifier = qualifier;
        self.control.reset();
        self.suggestions.clear();
    }

    /// Loads an item into the draft; the bound control starts over.
    pub(super) fn mirror_draft(&mut self, item: &Item) {
        self.draft.mirror(item);
        self.control.reset();
        self.suggestions.clear();
    }

    /// Removes an item together with the rest of its group.
    ///
    /// Readonly and required items are left alone.
    pub fn remove(&mut self, key: ItemKey) {
        let Some(target) = self.item(key).cloned() else {
            return;
        };
        if target.option.readonly || target.option.required {
            debug!(option = %target.option.title, "refusing to remove protected item");
            return;
        }

        let (removed, kept): (Vec<Item>, Vec<Item>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|other| other.key() == key || target.option.shares_group(&other.option));

        self.items = kept;
        self.draft.option = removed
            .first()
            .map(|item| DraftOption::Resolved(item.option.clone()));
        self.reset_draft_value();
        self.editing = None;
        self.update_options(None);
        self.focus_value(FocusTarget::ValueField);
        self.notify_items_changed();
    }

    /// Starts editing an item, focusing the value field.
    ///
    /// Tag items toggle their qualifier instead. Returns whether anything
    /// happened.
    pub fn edit(&mut self, key: ItemKey) -> bool {
        self.edit_focusing(key, FocusTarget::ValueField)
    }

    pub fn edit_focusing(&mut self, key: ItemKey, target: FocusTarget) -> bool {
        let Some(item) = self.item(key).cloned() else {
            return false;
        };
        if item.option.readonly {
            return false;
        }
        if item.option.is_tag() {
            return self.toggle_qualifier(key);
        }

        self.editing = Some(key);
        self.mirror_draft(&item);
        self.update_options(None);
        self.focus_value(target);
        true
    }

    /// Commits the draft.
    ///
    /// When the draft edits an item of the same option, that item is updated
    /// in place; `keep_editing` keeps it in edit mode. Otherwise new items are
    /// pushed for the option's whole group span. Incomplete or stale drafts
    /// are dropped silently.
    pub fn add(&mut self, keep_editing: bool) {
        let Some(option) = self.resolve_option(true) else {
            return;
        };
        if self.control.is_invalid() {
            debug!(option = %option.title, "value control is invalid, not adding");
            return;
        }

        let converted = convert(&option, self.draft.value.as_ref(), &self.dates);
        if option.is_tag() {
            self.draft.option = None;
        } else if converted.is_absent() {
            debug!(option = %option.title, ?converted, "draft value is not ready");
            return;
        }
        let value = converted.into_value();

        let last_option = self.editing_item().map(|item| item.option.clone());
        let mut next_edit: Option<ItemKey> = None;

        match self.editing.filter(|_| last_option.as_ref().is_some_and(|o| same_option(o, &option))) {
            Some(key) => {
                if keep_editing {
                    next_edit = Some(key);
                }
                let qualifier = self.draft.qualifier.clone();
                if let Some(item) = self.item_mut(key) {
                    item.value = value;
                    item.qualifier = qualifier;
                }
            }
            None => {
                if !contains_option(&self.filtered, &option) {
                    debug!(option = %option.title, "option is no longer selectable");
                    return;
                }
                let Some(index) = position_of(&self.options, &option) else {
                    return;
                };

                if !option.allow_multiple {
                    if let Some(alternative) = &option.alternative {
                        self.items
                            .retain(|item| item.option.alternative.as_ref() != Some(alternative));
                    }
                }

                let draft_qualifier = self
                    .draft
                    .qualifier
                    .clone()
                    .filter(|q| option.qualifiers.contains(q));

                for member in group_span(&self.options, index).map(|i| self.options[i].clone()) {
                    let mut item = span_item(&member, &option, value.as_ref());

                    if same_option(&member, &option) {
                        if draft_qualifier.is_some() {
                            item.qualifier = draft_qualifier.clone();
                        }
                        if last_option
                            .as_ref()
                            .is_some_and(|last| option.shares_alternative(last))
                        {
                            next_edit = Some(item.key());
                        }
                    }
                    self.items.push(item);
                }
            }
        }

        self.editing = next_edit;
        match next_edit.and_then(|key| self.item(key).cloned()) {
            Some(item) => self.mirror_draft(&item),
            None => self.reset_draft_value(),
        }

        self.update_options(last_option.as_ref());
        sort_items(&self.options, &mut self.items);
        self.notify_items_changed();
        self.focus_value(FocusTarget::ValueField);
    }

    /// Leaves edit mode without committing.
    pub fn cancel(&mut self, focus: bool) {
        if self.editing.is_none() {
            return;
        }
        self.editing = None;
        self.reset_draft_value();
        self.update_options(None);

        if focus {
            self.focus_value(FocusTarget::ValueField);
        }
    }

    /// Cycles a committed item's qualifier. Returns whether it changed.
    pub fn toggle_qualifier(&mut self, key: ItemKey) -> bool {
        let Some(item) = self.item_mut(key) else {
            return false;
        };
        let option = item.option.clone();
        if !cycle_qualifier(&option, &mut item.qualifier, &mut item.value) {
            return false;
        }
        self.notify_items_changed();
        true
    }

    /// Cycles the draft's qualifier. Returns whether it changed.
    pub fn toggle_draft_qualifier(&mut self) -> bool {
        let Some(option) = self.resolve_option(true) else {
            return false;
        };
        cycle_qualifier(&option, &mut self.draft.qualifier, &mut self.draft.value)
    }

    /// Binds the draft to `option` without any follow-up.
    pub fn set_draft_option(&mut self, option: OptionRef) {
        self.draft.option = Some(DraftOption::Resolved(option));
    }

    /// Handles picking an option from the option list.
    ///
    /// Picking a variant of the edited item's alternative switches the chip
    /// in place; picking a tag commits it on the next tick.
    pub fn select_option(&mut self, option: OptionRef) {
        self.draft.option = Some(DraftOption::Resolved(option.clone()));
        let edit_option = self.editing_item().map(|item| item.option.clone());

        match edit_option {
            Some(edit) if option.shares_alternative(&edit) => {
                if option.kind != edit.kind {
                    self.reset_draft_value();
                }
                self.add(true);
            }
            _ if option.is_tag() => {
                self.reset_draft_value();
                self.scheduler.arm(Task::TagCommit);
            }
            _ => {
                self.editing = None;
                self.reset_draft_value();
                self.update_options(None);
                self.focus_value(FocusTarget::ValueField);
            }
        }
    }

    /// Selects the option best matching `text` among the filtered options.
    pub fn select_option_text(&mut self, text: &str) -> Option<OptionRef> {
        let option = super::match_option(&self.filtered, text)?;
        self.select_option(option.clone());
        Some(option)
    }
}
