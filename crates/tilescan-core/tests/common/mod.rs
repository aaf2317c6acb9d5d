#![allow(dead_code)]

pub mod sources;

use tilescan_core::grid::{zoom_boxes, GeoBounds, RawTileGrid, TileGrid};
use tilescan_core::scheme::cursor::Cursor;
use tilescan_core::source::{SourceInfo, Tile, TileCoord};
use tilescan_core::{ScanError, ScanItem, ScanOptions, TileStream};

/// NZTM2000 grid (srid 2193) with the first five zoom levels.
pub fn nztm_grid() -> RawTileGrid {
    RawTileGrid {
        srid: Some(2193),
        resolutions: Some(vec![8960.0, 4480.0, 2240.0, 1120.0, 560.0]),
        origin: Some(vec![-1_000_000.0, 10_000_000.0]),
        tile_size: Some(256),
        bounds: Some(vec![274000.0, 3087000.0, 3327000.0, 7173000.0]),
    }
}

pub fn nztm_extent() -> GeoBounds {
    GeoBounds::new(274000.0, 3087000.0, 3327000.0, 7173000.0)
}

/// Zooms 0-3 over the full grid extent: 267 tiles.
pub fn nztm_options() -> ScanOptions {
    ScanOptions {
        tilegrid: Some(nztm_grid().into()),
        bounds: Some(nztm_extent()),
        minzoom: Some(0),
        maxzoom: Some(3),
        ..ScanOptions::default()
    }
}

pub fn plain_info() -> SourceInfo {
    SourceInfo {
        name: Some("plain_1".into()),
        description: Some("demo description".into()),
        minzoom: Some(0),
        maxzoom: Some(3),
        ..SourceInfo::default()
    }
}

/// Every position the unsharded scan of `nztm_options` visits, in order.
pub fn nztm_positions() -> Vec<TileCoord> {
    let grid = TileGrid::from_raw(&nztm_grid()).unwrap();
    let boxes = zoom_boxes(&grid, 0, 3, &nztm_extent()).unwrap();
    Cursor::new(boxes).collect()
}

/// Deterministic payload whose size depends on the coordinate.
pub fn payload(coord: TileCoord) -> Vec<u8> {
    let len = 100 + (coord.z as usize * 31 + coord.x as usize * 7 + coord.y as usize * 3) % 50;
    vec![coord.z; len]
}

/// Result of draining a stream.
#[derive(Debug, Default)]
pub struct Drained {
    pub info: Option<SourceInfo>,
    pub tiles: Vec<Tile>,
    pub errors: Vec<ScanError>,
    pub items_after_error: usize,
}

pub async fn drain(stream: &mut TileStream) -> Drained {
    let mut out = Drained::default();
    while let Some(item) = stream.next().await {
        if !out.errors.is_empty() {
            out.items_after_error += 1;
        }
        match item {
            Ok(ScanItem::Info(info)) => {
                assert!(out.info.is_none(), "info must be emitted once");
                assert!(out.tiles.is_empty(), "info must come first");
                out.info = Some(info);
            }
            Ok(ScanItem::Tile(tile)) => out.tiles.push(tile),
            Err(e) => out.errors.push(e),
        }
    }
    out
}
