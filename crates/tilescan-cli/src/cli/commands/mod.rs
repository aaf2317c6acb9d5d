//! CLI command handlers, one file per command.

mod plan;
mod scan;

use anyhow::{Context, Result};
use tilescan_core::grid::TileGridInput;

pub use plan::run_plan;
pub use scan::run_scan;

/// `--tilegrid` is either inline JSON or a path to a JSON file.
pub(crate) fn tilegrid_input(arg: &str) -> Result<TileGridInput> {
    if arg.trim_start().starts_with('{') {
        return Ok(TileGridInput::Encoded(arg.to_string()));
    }
    let text = std::fs::read_to_string(arg).with_context(|| format!("reading tilegrid {}", arg))?;
    Ok(TileGridInput::Encoded(text))
}
