//! The chips filter engine.
//!
//! [`FilterEngine`] owns the catalog, the committed items, the draft being
//! composed, and the derived list of selectable options. The presentation
//! layer calls its operations on user interaction and drains
//! [`EngineEvent`]s afterwards.
//!
//! # Example
//!
//! ```
//! use chips_filter_rs::{FilterEngine, FilterOption, Item, OptionType, Value};
//!
//! let report = FilterOption::new("Report", OptionType::Integer).readonly().shared();
//! let branch = FilterOption::new("Branch", OptionType::Integer).shared();
//!
//! let mut engine = FilterEngine::new(
//!     vec![report.clone(), branch],
//!     vec![Item::new(report, Some(Value::Integer(1203001)))],
//! );
//!
//! engine.set_option_text("bra");
//! let _ = engine.set_value(Some(Value::text("680")));
//! engine.add(false);
//!
//! assert_eq!(engine.items().len(), 2);
//! assert!(engine.filtered_options().is_empty());
//! ```

mod mutate;
mod reconcile;
mod resolve;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{EngineConfig, OptionListPresentation, OptionsStyle};
use crate::convert::{self, DateAdapter, DateContext};
use crate::item::{Draft, DraftOption, Item, ItemKey};
use crate::option::{FilterOption, OptionRef};
use crate::schedule::{FocusTarget, ClickAwayCheck, Scheduler, Task, TaskSlot};
use crate::suggest::{SuggestionOutcome, SuggestionRequest, Suggestions};
use crate::validate::{ValidationOutcome, ValidationRequest, ValueControl};
use crate::value::Value;

pub use reconcile::sort_items;
pub use resolve::match_option;

/// Notifications queued for the host.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The committed item list changed.
    ItemsChanged(Vec<Item>),
    /// The user asked to run the search with these items.
    SearchRequested(Vec<Item>),
    /// An input should receive focus and select its content.
    FocusRequested(FocusTarget),
}

/// Option resolution and item reconciliation for a chips filter.
pub struct FilterEngine {
    options: Vec<OptionRef>,
    items: Vec<Item>,
    filtered: Vec<OptionRef>,
    draft: Draft,
    editing: Option<ItemKey>,
    style: OptionsStyle,
    dates: DateContext,
    control: ValueControl,
    suggestions: Suggestions,
    scheduler: Scheduler,
    popup: bool,
    focus_within: bool,
    events: Vec<EngineEvent>,
}

impl FilterEngine {
    /// Creates an engine with default settings and synchronizes it with the
    /// given catalog and items.
    pub fn new(options: Vec<OptionRef>, items: Vec<Item>) -> Self {
        Self::with_config(options, items, &EngineConfig::default())
    }

    pub fn with_config(options: Vec<OptionRef>, items: Vec<Item>, config: &EngineConfig) -> Self {
        let mut engine = Self {
            options: Vec::new(),
            items: Vec::new(),
            filtered: Vec::new(),
            draft: Draft::default(),
            editing: None,
            style: config.options_style,
            dates: DateContext {
                pattern: config.date_format.clone(),
                ..DateContext::default()
            },
            control: ValueControl::default(),
            suggestions: Suggestions::default(),
            scheduler: Scheduler::new(),
            popup: false,
            focus_within: false,
            events: Vec::new(),
        };
        engine.options = options;
        engine.items = items;
        engine.synchronize();
        engine
    }

    /// Replaces the date collaborator; `None` formats dates as ISO text.
    pub fn set_date_adapter(&mut self, adapter: Option<Arc<dyn DateAdapter>>) {
        self.dates.adapter = adapter;
    }

    pub fn set_options_style(&mut self, style: OptionsStyle) {
        self.style = style;
    }

    // ==================== Inbound lists ====================

    /// Replaces the option catalog and resynchronizes.
    pub fn set_options(&mut self, options: Vec<OptionRef>) {
        self.options = options;
        self.synchronize();
    }

    /// Replaces the committed items and resynchronizes.
    pub fn set_items(&mut self, items: Vec<Item>) {
        self.items = items;
        self.synchronize();
    }

    /// Full recomputation after a wholesale replacement of either list.
    fn synchronize(&mut self) {
        debug!(
            options = self.options.len(),
            items = self.items.len(),
            "synchronizing chips filter"
        );

        if self
            .editing
            .is_some_and(|key| !self.items.iter().any(|i| i.key() == key))
        {
            self.editing = None;
            self.draft.option = None;
            self.reset_draft_value();
        }

        for item in &mut self.items {
            item.backfill_tag_qualifier();
        }

        self.ensure_required_items();
        self.update_options(None);
        sort_items(&self.options, &mut self.items);
    }

    // ==================== Accessors ====================

    pub fn options(&self) -> &[OptionRef] {
        &self.options
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, key: ItemKey) -> Option<&Item> {
        self.items.iter().find(|i| i.key() == key)
    }

    fn item_mut(&mut self, key: ItemKey) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.key() == key)
    }

    pub fn filtered_options(&self) -> &[OptionRef] {
        &self.filtered
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The key of the item currently being edited.
    pub fn editing(&self) -> Option<ItemKey> {
        self.editing
    }

    pub(crate) fn editing_item(&self) -> Option<&Item> {
        self.editing.and_then(|key| self.item(key))
    }

    pub fn control(&self) -> &ValueControl {
        &self.control
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Removes and returns the queued notifications.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn notify_items_changed(&mut self) {
        self.events.push(EngineEvent::ItemsChanged(self.items.clone()));
    }

    /// Queues a search request with the current items.
    pub fn request_search(&mut self) {
        self.events
            .push(EngineEvent::SearchRequested(self.items.clone()));
    }

    // ==================== Draft input ====================

    /// Stores text typed into the option field, unresolved.
    pub fn set_option_text(&mut self, text: impl Into<String>) {
        self.draft.option = Some(DraftOption::Unresolved(text.into()));
    }

    /// Stores the raw draft value and returns the validation request for it.
    ///
    /// The request must be run and its outcome handed to
    /// [`complete_validation`](Self::complete_validation); older outcomes
    /// are ignored once a newer request exists.
    pub fn set_value(&mut self, raw: Option<Value>) -> ValidationRequest {
        self.draft.value = raw;
        self.validation_request()
    }

    /// Builds a validation request for the current draft value.
    pub fn validation_request(&mut self) -> ValidationRequest {
        let option = self.resolve_option(true);
        let sequence = self.control.begin();
        ValidationRequest::new(sequence, option, self.draft.value.clone(), self.dates.clone())
    }

    /// Validates the current draft value and applies the result.
    pub async fn validate(&mut self) -> Option<crate::validate::ValidationError> {
        let outcome = self.validation_request().run().await;
        self.complete_validation(&outcome);
        outcome.error
    }

    /// Applies a validation outcome. Returns false when it was stale.
    pub fn complete_validation(&mut self, outcome: &ValidationOutcome) -> bool {
        let applied = self.control.complete(outcome);
        if !applied {
            debug!(sequence = outcome.sequence, "ignoring stale validation outcome");
        }
        applied
    }

    /// Builds a candidate lookup for the typed draft value.
    ///
    /// Returns `None` when the draft has no option or the option has no
    /// candidate source. Blank text asks for every candidate.
    pub fn suggestions_request(&mut self) -> Option<SuggestionRequest> {
        let option = self.resolve_option(true)?;
        if option.values.is_none() {
            return None;
        }
        let fragment = self
            .draft
            .value
            .clone()
            .filter(|value| !matches!(value, Value::Text(text) if text.trim().is_empty()));
        let sequence = self.suggestions.begin();
        Some(SuggestionRequest::new(sequence, option, fragment))
    }

    /// Applies a suggestion outcome. Returns false when it was stale.
    pub fn complete_suggestions(&mut self, outcome: &SuggestionOutcome) -> bool {
        let applied = self.suggestions.complete(outcome);
        if !applied {
            debug!(sequence = outcome.sequence, "ignoring stale suggestions");
        }
        applied
    }

    /// Candidates for the draft value from the latest completed lookup.
    pub fn suggestions(&self) -> &[Value] {
        self.suggestions.candidates()
    }

    // ==================== Formatting ====================

    /// Formats a value against a specific option.
    pub fn format(&self, option: &FilterOption, value: Option<&Value>, detailed: bool) -> String {
        convert::format(option, value, detailed, &self.dates)
    }

    /// Formats a value against the draft's resolved option, without title.
    pub fn format_value(&self, value: Option<&Value>) -> String {
        self.draft
            .resolved()
            .map(|option| self.format(option, value, false))
            .unwrap_or_default()
    }

    /// Formats a committed item as chip text, with title.
    pub fn format_item(&self, item: &Item) -> String {
        self.format(&item.option, item.value.as_ref(), true)
    }

    pub fn option_title(option: Option<&FilterOption>) -> &str {
        option.map(|o| o.title.as_str()).unwrap_or_default()
    }

    // ==================== Focus and activity ====================

    /// Arms a deferred focus shift, cancelling any pending one.
    pub fn focus_value(&mut self, target: FocusTarget) {
        self.scheduler.arm(Task::Focus(target));
    }

    /// Records whether keyboard focus is anywhere inside the widget.
    pub fn set_focus_within(&mut self, focused: bool) {
        self.focus_within = focused;
    }

    /// Records the popup state and arms the click-away check.
    pub fn toggle_popup(&mut self, open: bool) {
        self.popup = open;
        self.scheduler.arm_if_idle(Task::ClickAway(ClickAwayCheck::Popup));
    }

    /// Arms the click-away check after an input lost focus.
    pub fn blur(&mut self) {
        self.scheduler.arm_if_idle(Task::ClickAway(ClickAwayCheck::Blur));
    }

    pub fn is_popup_open(&self) -> bool {
        self.popup
    }

    /// True while the popup is open, an item is being edited, or focus work
    /// is pending.
    pub fn is_active(&self) -> bool {
        self.popup
            || self.editing.is_some()
            || self.scheduler.is_pending(TaskSlot::Focus)
            || self.scheduler.is_pending(TaskSlot::ClickAway)
    }

    pub fn option_list_presentation(&self) -> OptionListPresentation {
        self.style.presentation(self.is_active())
    }

    /// Advances deferred work by one tick and runs whatever became due.
    pub fn tick(&mut self) {
        for task in self.scheduler.advance() {
            trace!(?task, "running deferred task");
            match task {
                Task::Focus(target) => self.events.push(EngineEvent::FocusRequested(target)),
                Task::ClickAway(kind) => self.check_click_away(kind),
                Task::TagCommit => self.add(true),
            }
        }
    }

    fn check_click_away(&mut self, kind: ClickAwayCheck) {
        if self.focus_within {
            return;
        }
        let cancel = match kind {
            ClickAwayCheck::Popup => true,
            ClickAwayCheck::Blur => {
                !self.popup
                    && self
                        .editing_item()
                        .is_some_and(|item| item.value == self.draft.value)
            }
        };
        if cancel {
            debug!(?kind, "focus left the widget, cancelling edit");
            self.cancel(false);
        }
    }
}
