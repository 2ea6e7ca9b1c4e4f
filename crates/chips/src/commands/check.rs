//! Check command implementation.
//!
//! Loads a catalog file, validates it and lists its options.

use std::path::Path;

use chips_filter_rs::Catalog;
use tracing::debug;

use super::{CommandContext, Result};
use crate::output::{format_catalog_json, format_catalog_table};

/// Executes the check command.
pub fn execute(ctx: &CommandContext, path: &Path) -> Result<()> {
    let catalog = Catalog::from_path(path)?;
    debug!(
        path = %path.display(),
        options = catalog.options.len(),
        items = catalog.items.len(),
        "catalog loaded"
    );

    if ctx.json_output {
        println!("{}", format_catalog_json(&catalog)?);
    } else if !ctx.quiet {
        print!("{}", format_catalog_table(&catalog, ctx.use_colors));
    }

    Ok(())
}
