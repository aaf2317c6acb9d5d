//! `tilescan plan` – show what a scan would cover.

use anyhow::{Context, Result};
use std::path::Path;
use tilescan_core::grid::{zoom_boxes, TileGrid, ZoomBoxes};
use tilescan_core::scheme::params::{resolve, ExplicitParams};
use tilescan_core::source::dir::DirSource;
use tilescan_core::source::{SourceInfo, TileSource};

use super::tilegrid_input;
use crate::cli::RangeArgs;

pub async fn run_plan(range: &RangeArgs, source: Option<&Path>) -> Result<()> {
    let grid = TileGrid::from_input(&tilegrid_input(&range.tilegrid)?)?;
    let info = match source {
        Some(root) => DirSource::new(root)
            .get_info()
            .await
            .with_context(|| format!("reading metadata from {}", root.display()))?,
        None => SourceInfo::default(),
    };
    let boxes = plan(&grid, range, &info)?;

    println!(
        "{:<4} {:>8} {:>8} {:>8} {:>8} {:>12}",
        "Z", "MIN_X", "MIN_Y", "MAX_X", "MAX_Y", "TILES"
    );
    for (z, b) in boxes.iter() {
        println!(
            "{:<4} {:>8} {:>8} {:>8} {:>8} {:>12}",
            z,
            b.min_x,
            b.min_y,
            b.max_x,
            b.max_y,
            b.area()
        );
    }
    println!("total {}", boxes.total());
    Ok(())
}

fn plan(grid: &TileGrid, range: &RangeArgs, info: &SourceInfo) -> Result<ZoomBoxes> {
    if let Some(bounds) = &range.bounds {
        bounds.check_order()?;
    }
    let explicit = ExplicitParams {
        bounds: range.bounds,
        minzoom: range.minzoom,
        maxzoom: range.maxzoom,
    };
    let params = resolve(&explicit, grid, info)?;
    Ok(zoom_boxes(grid, params.minzoom, params.maxzoom, &params.bounds)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(minzoom: Option<u8>, maxzoom: Option<u8>) -> RangeArgs {
        RangeArgs {
            tilegrid: r#"{"srid":2193,"resolutions":[8960,4480,2240,1120,560],"origin":[-1000000,10000000],"bounds":[274000,3087000,3327000,7173000]}"#.to_string(),
            bounds: None,
            minzoom,
            maxzoom,
        }
    }

    fn grid(r: &RangeArgs) -> TileGrid {
        TileGrid::from_input(&tilegrid_input(&r.tilegrid).unwrap()).unwrap()
    }

    #[test]
    fn plan_uses_grid_bounds_when_nothing_else_is_set() {
        let r = range(Some(0), Some(3));
        let boxes = plan(&grid(&r), &r, &SourceInfo::default()).unwrap();
        assert_eq!(boxes.total(), 267);
        let z0 = boxes.get(0).unwrap();
        assert_eq!((z0.min_x, z0.min_y, z0.max_x, z0.max_y), (0, 1, 1, 3));
    }

    #[test]
    fn plan_takes_zooms_from_source_info() {
        let r = range(None, None);
        let info = SourceInfo {
            minzoom: Some(4),
            maxzoom: Some(4),
            ..SourceInfo::default()
        };
        let boxes = plan(&grid(&r), &r, &info).unwrap();
        assert_eq!(boxes.total(), 690);
    }

    #[test]
    fn plan_without_zooms_fails() {
        let r = range(Some(0), None);
        let err = plan(&grid(&r), &r, &SourceInfo::default()).unwrap_err();
        assert_eq!(err.to_string(), "No maxzoom determined");
    }

    #[tokio::test]
    async fn plan_reads_directory_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("metadata.json"),
            r#"{"name":"nz","minzoom":1,"maxzoom":2}"#,
        )
        .unwrap();
        let r = range(None, None);
        let info = DirSource::new(dir.path()).get_info().await.unwrap();
        let boxes = plan(&grid(&r), &r, &info).unwrap();
        assert_eq!(boxes.total(), 15 + 54);
    }
}
