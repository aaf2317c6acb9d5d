//! Tile source capability: what a scan needs from a storage backend.
//!
//! Backends report their metadata and serve single tiles. A missing tile is
//! an explicit [`SourceError::NotFound`]; everything else is a failure the
//! retry layer may try again.

pub mod dir;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Legacy error text suffix that marks an absent tile.
pub const NOT_FOUND_SUFFIX: &str = "does not exist";

/// Address of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// Formats as `z/x/y`.
impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A fetched tile. The payload is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub coord: TileCoord,
    pub data: Vec<u8>,
}

impl Tile {
    pub fn new(coord: TileCoord, data: Vec<u8>) -> Self {
        Self { coord, data }
    }

    pub fn z(&self) -> u8 {
        self.coord.z
    }

    pub fn x(&self) -> u32 {
        self.coord.x
    }

    pub fn y(&self) -> u32 {
        self.coord.y
    }
}

/// Metadata reported by a source. Bounds components may be null because
/// sources are not trusted to report well-formed extents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    /// Any value that is not an array of numbers keeps its slot as a
    /// `None` component; a non-array becomes an empty list.
    #[serde(
        default,
        deserialize_with = "lenient_bounds",
        skip_serializing_if = "Option::is_none"
    )]
    pub bounds: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Vec<f64>>,
    /// Any other keys the source reports (format, version, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn lenient_bounds<'de, D>(deserializer: D) -> Result<Option<Vec<Option<f64>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        serde_json::Value::Array(items) => items.iter().map(serde_json::Value::as_f64).collect(),
        _ => Vec::new(),
    }))
}

/// Error from a tile source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// No content at this position. Not a failure.
    #[error("Tile does not exist")]
    NotFound,
    /// Anything else: I/O, timeouts, corrupt storage.
    #[error("{0}")]
    Failed(String),
}

impl SourceError {
    /// Map legacy error text: anything ending in "does not exist" is absence.
    pub fn from_message(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.ends_with(NOT_FOUND_SUFFIX) {
            SourceError::NotFound
        } else {
            SourceError::Failed(msg)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound)
    }
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            SourceError::NotFound
        } else {
            SourceError::Failed(e.to_string())
        }
    }
}

/// Backend that can describe itself and serve single tiles.
pub trait TileSource: Send + Sync + 'static {
    /// Metadata: name, zoom range, bounds, center, ...
    fn get_info(&self) -> impl Future<Output = Result<SourceInfo, SourceError>> + Send;

    /// Payload of one tile, or [`SourceError::NotFound`].
    fn get_tile(
        &self,
        coord: TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(json: &str) -> SourceInfo {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn malformed_bounds_still_parse() {
        assert_eq!(info(r#"{"bounds":"nope"}"#).bounds, Some(vec![]));
        assert_eq!(info(r#"{"bounds":{"w":1}}"#).bounds, Some(vec![]));
        assert_eq!(
            info(r#"{"bounds":[null,1,"x",2.5]}"#).bounds,
            Some(vec![None, Some(1.0), None, Some(2.5)])
        );
        assert_eq!(info(r#"{"bounds":null}"#).bounds, None);
        assert_eq!(info(r#"{"name":"nz"}"#).bounds, None);
    }

    #[test]
    fn legacy_messages_map_to_not_found() {
        assert_eq!(
            SourceError::from_message("Tile does not exist"),
            SourceError::NotFound
        );
        assert_eq!(
            SourceError::from_message("Grid does not exist"),
            SourceError::NotFound
        );
        assert_eq!(
            SourceError::from_message("does not exist: 1/2/3"),
            SourceError::Failed("does not exist: 1/2/3".into())
        );
        assert_eq!(
            SourceError::from_message("Fatal"),
            SourceError::Failed("Fatal".into())
        );
    }

    #[test]
    fn io_not_found_is_absence() {
        let e = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(SourceError::from(e).is_not_found());
        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(!SourceError::from(e).is_not_found());
    }

    #[test]
    fn info_keeps_unknown_keys() {
        let json = r#"{
            "name": "plain_1",
            "minzoom": 0,
            "maxzoom": 4,
            "bounds": [-180, null, 180, 85],
            "center": [0, 7.5, 2],
            "version": "1.0.3"
        }"#;
        let info: SourceInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name.as_deref(), Some("plain_1"));
        assert_eq!(info.maxzoom, Some(4));
        assert_eq!(
            info.bounds,
            Some(vec![Some(-180.0), None, Some(180.0), Some(85.0)])
        );
        assert_eq!(info.extra.get("version").and_then(|v| v.as_str()), Some("1.0.3"));
    }

    #[test]
    fn coord_display() {
        assert_eq!(TileCoord::new(3, 12, 9).to_string(), "3/12/9");
    }
}
