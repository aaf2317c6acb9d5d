//! Error taxonomy for a scan.
//!
//! Absence of a tile (source says it does not exist, empty payload, or the
//! job shard rejects the position) is not an error and never shows up here.

use crate::source::{SourceError, TileCoord};

/// Message used for every malformed set of resolved bounds.
pub const BOUNDS_SHAPE_MESSAGE: &str =
    "bounds must be an array of the form [west, south, east, north]";

/// Fatal error for a scan. Any of these ends the output stream.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Malformed or missing construction options; raised before any I/O.
    #[error("{0}")]
    Configuration(String),

    /// Zoom range or bounds still undetermined after consulting the source.
    #[error("{0}")]
    Resolution(String),

    /// Resolved bounds are not four finite numbers.
    #[error("{0}")]
    Validation(String),

    /// The source failed to report its metadata.
    #[error("tile source info: {0}")]
    Info(#[source] SourceError),

    /// A tile fetch failed and the retry budget is spent.
    #[error("tile {coord}: {source}")]
    Fetch {
        coord: TileCoord,
        #[source]
        source: SourceError,
    },

    /// A fetch task panicked or was torn down unexpectedly.
    #[error("fetch task: {0}")]
    Task(String),
}

impl ScanError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ScanError::Configuration(msg.into())
    }

    pub(crate) fn invalid_bounds() -> Self {
        ScanError::Validation(BOUNDS_SHAPE_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_exact() {
        let err = ScanError::invalid_bounds();
        assert_eq!(
            err.to_string(),
            "bounds must be an array of the form [west, south, east, north]"
        );
    }

    #[test]
    fn fetch_error_names_the_tile() {
        let err = ScanError::Fetch {
            coord: TileCoord::new(3, 4, 9),
            source: SourceError::Failed("Fatal".into()),
        };
        assert_eq!(err.to_string(), "tile 3/4/9: Fatal");
    }
}
