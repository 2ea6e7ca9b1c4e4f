//! Option resolution and item reconciliation for a chips-style filter.
//!
//! A host supplies a catalog of [`FilterOption`]s and the committed
//! [`Item`]s; the [`FilterEngine`] keeps the selectable options, the draft
//! being composed and the item order consistent as the user adds, edits,
//! removes and toggles chips. Catalogs can be loaded from TOML or JSON files
//! with [`Catalog`].

pub mod catalog;
pub mod config;
pub mod convert;
pub mod engine;
pub mod item;
pub mod option;
pub mod schedule;
pub mod suggest;
pub mod validate;
pub mod value;

pub use catalog::{Catalog, CatalogError, CatalogFile, CatalogResult, ItemSpec, OptionSpec};
pub use config::{EngineConfig, OptionListPresentation, OptionsStyle};
pub use convert::{ChronoDateAdapter, DateAdapter, DateContext};
pub use engine::{match_option, sort_items, EngineEvent, FilterEngine};
pub use item::{Draft, DraftOption, Item, ItemKey};
pub use option::{
    same_option, FilterOption, OptionRef, OptionType, ValueConverter, ValueFormatter, ValueSource,
    ValueValidator,
};
pub use schedule::{FocusTarget, ClickAwayCheck, Scheduler, Task, TaskSlot};
pub use suggest::{SuggestionOutcome, SuggestionRequest, Suggestions};
pub use validate::{
    validate_value, ControlStatus, ValidationError, ValidationKind, ValidationOutcome,
    ValidationRequest, ValueControl,
};
pub use value::{Converted, Qualifier, Value};
