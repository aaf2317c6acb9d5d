pub mod config;
pub mod logging;

pub mod error;
pub mod grid;
pub mod job;
pub mod retry;
pub mod scheme;
pub mod source;
pub mod stats;

pub use error::ScanError;
pub use scheme::{ProjectedScheme, ScanItem, ScanOptions, TileStream};
pub use source::{SourceError, SourceInfo, Tile, TileCoord, TileSource};
