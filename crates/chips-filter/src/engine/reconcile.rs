//! Recomputing the selectable options and keeping items in catalog order.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::debug;

use super::FilterEngine;
use crate::item::{DraftOption, Item};
use crate::option::{contains_option, same_option, OptionRef};
use crate::value::{tag_qualifier_for, Value};

/// Sorts items into catalog order, collapsing each group to one rank.
///
/// The sort is stable, so items of equal rank keep their relative order.
/// Items whose option is not in the catalog sort first.
pub fn sort_items(options: &[OptionRef], items: &mut [Item]) {
    let mut ranks: Vec<(&OptionRef, i64)> = Vec::with_capacity(options.len());
    let mut previous: Option<&OptionRef> = None;
    let mut rank = -1;

    for option in options {
        let continues_group = previous.is_some_and(|p| option.shares_group(p));
        if !continues_group {
            rank += 1;
        }
        previous = Some(option);
        ranks.push((option, rank));
    }

    let rank_of = |item: &Item| {
        ranks
            .iter()
            .find(|(option, _)| same_option(option, &item.option))
            .map_or(-1, |(_, rank)| *rank)
    };

    items.sort_by_key(rank_of);
}

/// The contiguous run of catalog entries sharing the group at `index`.
pub(crate) fn group_span(options: &[OptionRef], index: usize) -> RangeInclusive<usize> {
    let option = &options[index];
    let mut start = index;
    let mut end = index;

    if option.group.is_some() {
        while start > 0 && options[start - 1].group == option.group {
            start -= 1;
        }
        while end + 1 < options.len() && options[end + 1].group == option.group {
            end += 1;
        }
    }

    start..=end
}

/// Builds the item a span member receives when `added` is committed with
/// `value`.
pub(crate) fn span_item(member: &OptionRef, added: &OptionRef, value: Option<&Value>) -> Item {
    let mut qualifier = member.qualifiers.first().cloned();
    let mut member_value = if same_option(member, added) || member.kind == added.kind {
        value.cloned()
    } else {
        None
    };

    if member.is_tag() {
        let tag = qualifier.get_or_insert_with(|| tag_qualifier_for(value));
        if member_value.is_none() {
            member_value = Some(tag.value.clone());
        }
    }

    Item::new(member.clone(), member_value).with_qualifier(qualifier)
}

impl FilterEngine {
    /// Gives every required option without an item an empty one, together
    /// with its group span.
    pub(crate) fn ensure_required_items(&mut self) {
        for index in 0..self.options.len() {
            let option = &self.options[index];
            let present = |o: &OptionRef| self.items.iter().any(|i| same_option(&i.option, o));

            if !option.required || present(option) {
                continue;
            }

            let added: Vec<Item> = group_span(&self.options, index)
                .map(|i| &self.options[i])
                .filter(|member| !present(*member))
                .map(|member| span_item(member, option, None))
                .collect();

            debug!(option = %option.title, count = added.len(), "pre-populating required option");
            self.items.extend(added);
        }
    }

    /// Recomputes the selectable options after a structural change.
    ///
    /// `hint` is the option that was being edited before the change; when it
    /// belongs to a group, editing resumes on the next item of that group.
    pub fn update_options(&mut self, hint: Option<&OptionRef>) {
        let mut option = self.resolve_option(true);
        let edit_option = self.editing_item().map(|item| item.option.clone());
        let edit_alternative = edit_option.as_ref().and_then(|o| o.alternative.clone());

        let alternatives: HashMap<String, Option<String>> = self
            .items
            .iter()
            .filter_map(|item| {
                let alternative = item.option.alternative.as_ref()?;
                (Some(alternative) != edit_alternative.as_ref())
                    .then(|| (alternative.clone(), item.option.group.clone()))
            })
            .collect();

        let used: Vec<&OptionRef> = self
            .items
            .iter()
            .filter(|item| !item.option.allow_multiple && Some(item.key()) != self.editing)
            .map(|item| &item.option)
            .collect();

        let mut filtered: Vec<OptionRef> = self
            .options
            .iter()
            .filter(|candidate| !used.iter().any(|u| same_option(u, candidate)))
            .filter(|candidate| match &edit_option {
                None => candidate.alternative.as_ref().is_none_or(|alternative| {
                    alternatives
                        .get(alternative)
                        .is_none_or(|group| *group == candidate.group)
                }),
                Some(edit) => same_option(edit, candidate) || edit.shares_alternative(candidate),
            })
            .cloned()
            .collect();

        if option
            .as_ref()
            .is_some_and(|o| !contains_option(&filtered, o))
        {
            option = None;
            self.draft.option = None;
            self.reset_draft_value();
        }

        if option.is_none() {
            self.reset_draft_value();
            self.resume_editing(hint);

            if !filtered.is_empty() {
                if self.draft.option.is_none() {
                    self.draft.option = Some(DraftOption::Resolved(filtered[0].clone()));
                    self.reset_draft_value();
                }
            } else if let Some(item) = self.editing_item() {
                filtered.push(item.option.clone());
            }
        }

        let mut i = 1;
        while i < filtered.len() {
            let candidate = &filtered[i];
            let is_edit = edit_option.as_ref().is_some_and(|e| same_option(e, candidate));
            let grouped_with_previous = candidate.shares_group(&filtered[i - 1]);
            let weaker_variant = edit_option.as_ref().is_some_and(|e| {
                e.shares_alternative(candidate) && !candidate.required && e.required
            });

            if !is_edit && (grouped_with_previous || weaker_variant) {
                filtered.remove(i);
            } else {
                i += 1;
            }
        }

        self.filtered = filtered;
        self.control.mark_pristine();
    }

    /// Picks an item to continue editing once the draft has no option.
    fn resume_editing(&mut self, hint: Option<&OptionRef>) {
        if let Some(hint) = hint.filter(|h| h.group.is_some()) {
            let next = self
                .items
                .iter()
                .skip_while(|item| !same_option(&item.option, hint))
                .skip(1)
                .find(|item| {
                    item.option.group == hint.group && !item.option.readonly && !item.option.is_tag()
                })
                .cloned();

            if let Some(item) = next {
                self.mirror_draft(&item);
                self.editing = Some(item.key());
            }
        }

        if self.editing.is_none() {
            let empty = self
                .items
                .iter()
                .find(|item| item.value.is_none() && !item.option.is_tag())
                .cloned();

            if let Some(item) = empty {
                self.mirror_draft(&item);
                self.editing = Some(item.key());
            }
        }
    }
}
