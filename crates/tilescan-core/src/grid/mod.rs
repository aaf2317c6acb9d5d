//! Tile grid model: projection id, per-zoom resolutions, pixel origin, and
//! the geographic bounds a scan covers.
//!
//! Grids arrive either as structured values or as their serialized JSON
//! form; both are checked here before anything touches a tile source.

pub mod bbox;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScanError;

pub use bbox::{zoom_box, zoom_boxes, ZoomBox, ZoomBoxes};

/// Spherical Mercator ids; those grids belong to the scanline enumerator.
pub const MERCATOR_SRIDS: [u32; 2] = [900913, 3857];

/// Pixels per tile edge when the grid does not say.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Tile grid as supplied by the caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTileGrid {
    #[serde(default)]
    pub srid: Option<u32>,
    #[serde(default)]
    pub resolutions: Option<Vec<f64>>,
    #[serde(default)]
    pub origin: Option<Vec<f64>>,
    #[serde(default, alias = "tileSize")]
    pub tile_size: Option<u32>,
    #[serde(default)]
    pub bounds: Option<Vec<f64>>,
}

/// A grid given inline or as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileGridInput {
    Encoded(String),
    Grid(RawTileGrid),
}

impl From<RawTileGrid> for TileGridInput {
    fn from(grid: RawTileGrid) -> Self {
        TileGridInput::Grid(grid)
    }
}

/// Validated, immutable tile grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    pub srid: u32,
    /// Units per pixel, indexed by zoom.
    pub resolutions: Vec<f64>,
    /// Geographic coordinate of pixel (0, 0); y grows southward from here.
    pub origin: (f64, f64),
    pub tile_size: u32,
    pub bounds: Option<GeoBounds>,
}

impl TileGrid {
    /// Validate a caller-supplied grid.
    pub fn from_input(input: &TileGridInput) -> Result<Self, ScanError> {
        match input {
            TileGridInput::Grid(raw) => Self::from_raw(raw),
            TileGridInput::Encoded(text) => {
                let raw: RawTileGrid = serde_json::from_str(text)
                    .map_err(|e| ScanError::config(format!("not a tilegrid: {}", e)))?;
                Self::from_raw(&raw)
            }
        }
    }

    pub fn from_raw(raw: &RawTileGrid) -> Result<Self, ScanError> {
        let bounds = match raw.bounds.as_deref() {
            None => None,
            Some(b) => Some(GeoBounds::from_slice(b).map_err(|_| {
                ScanError::config("tilegrid.bounds must be an array of the form [w,s,e,n]")
            })?),
        };

        let srid = match raw.srid {
            Some(srid) if srid != 0 => srid,
            _ => return Err(ScanError::config("missing tilegrid srid")),
        };
        if MERCATOR_SRIDS.contains(&srid) {
            return Err(ScanError::config(
                "use the scanline scheme for 900913/3857",
            ));
        }

        let resolutions = match raw.resolutions.as_deref() {
            Some(r) if !r.is_empty() => r.to_vec(),
            _ => return Err(ScanError::config("tilegrid.resolutions must be a non-empty array")),
        };
        if resolutions.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(ScanError::config(
                "tilegrid.resolutions must be positive numbers",
            ));
        }

        let origin = match raw.origin.as_deref() {
            Some([x, y]) if x.is_finite() && y.is_finite() => (*x, *y),
            _ => return Err(ScanError::config("tilegrid.origin must be an array of the form [x,y]")),
        };

        let tile_size = raw.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
        if tile_size == 0 {
            return Err(ScanError::config("tilegrid tile size must be > 0"));
        }

        Ok(TileGrid {
            srid,
            resolutions,
            origin,
            tile_size,
            bounds,
        })
    }

    /// Highest zoom with a resolution entry.
    pub fn max_zoom(&self) -> u8 {
        (self.resolutions.len() - 1).min(u8::MAX as usize) as u8
    }

    pub fn resolution(&self, z: u8) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }
}

/// Geographic extent `[west, south, east, north]` in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl From<[f64; 4]> for GeoBounds {
    fn from(b: [f64; 4]) -> Self {
        GeoBounds::new(b[0], b[1], b[2], b[3])
    }
}

impl From<GeoBounds> for [f64; 4] {
    fn from(b: GeoBounds) -> Self {
        [b.west, b.south, b.east, b.north]
    }
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Four finite numbers, any order.
    pub fn from_slice(b: &[f64]) -> Result<Self, ScanError> {
        match b {
            [w, s, e, n] if b.iter().all(|v| v.is_finite()) => Ok(Self::new(*w, *s, *e, *n)),
            _ => Err(ScanError::invalid_bounds()),
        }
    }

    /// Bounds as reported by a source, where any component may be null.
    pub fn from_components(b: &[Option<f64>]) -> Result<Self, ScanError> {
        match b {
            [Some(w), Some(s), Some(e), Some(n)] => Self::from_slice(&[*w, *s, *e, *n]),
            _ => Err(ScanError::invalid_bounds()),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.west.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.north.is_finite()
    }

    /// Reject west > east or south > north.
    pub fn check_order(&self) -> Result<(), ScanError> {
        if self.west > self.east {
            return Err(ScanError::config("bounds west cannot be greater than east"));
        }
        if self.south > self.north {
            return Err(ScanError::config("bounds south cannot be greater than north"));
        }
        Ok(())
    }

    /// Reject any edge that lies outside `outer`.
    pub fn check_within(&self, outer: &GeoBounds) -> Result<(), ScanError> {
        if self.west < outer.west {
            return Err(ScanError::config("bounds has invalid west value"));
        }
        if self.south < outer.south {
            return Err(ScanError::config("bounds has invalid south value"));
        }
        if self.east > outer.east {
            return Err(ScanError::config("bounds has invalid east value"));
        }
        if self.north > outer.north {
            return Err(ScanError::config("bounds has invalid north value"));
        }
        Ok(())
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

/// Parses `west,south,east,north`.
impl FromStr for GeoBounds {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ScanError::invalid_bounds())?;
        GeoBounds::from_slice(&parts)
    }
}
