//! Output formatting utilities for the chips CLI.
//!
//! - [`session`] - Session state and search results
//! - [`catalog`] - Catalog listing for the check command

mod catalog;
mod session;

pub use catalog::{format_catalog_json, format_catalog_table};
pub use session::{
    format_search_json, format_state_json, format_state_table, format_suggestions_json,
};
