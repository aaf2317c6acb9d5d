//! Effective scan parameters: explicit options first, then whatever the
//! source reports, then the grid's own bounds.

use crate::error::ScanError;
use crate::grid::{GeoBounds, TileGrid};
use crate::source::SourceInfo;

/// Zoom range and bounds a run will cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParams {
    pub bounds: GeoBounds,
    pub minzoom: u8,
    pub maxzoom: u8,
}

/// Values given at construction; any may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExplicitParams {
    pub bounds: Option<GeoBounds>,
    pub minzoom: Option<u8>,
    pub maxzoom: Option<u8>,
}

pub fn resolve(
    explicit: &ExplicitParams,
    grid: &TileGrid,
    info: &SourceInfo,
) -> Result<ResolvedParams, ScanError> {
    let reported = info.bounds.as_deref();
    if explicit.bounds.is_none() && reported.is_none() && grid.bounds.is_none() {
        return Err(ScanError::Resolution("No bounds determined".into()));
    }
    let minzoom = explicit
        .minzoom
        .or(info.minzoom)
        .ok_or_else(|| ScanError::Resolution("No minzoom determined".into()))?;
    let maxzoom = explicit
        .maxzoom
        .or(info.maxzoom)
        .ok_or_else(|| ScanError::Resolution("No maxzoom determined".into()))?;

    let bounds = match (explicit.bounds, reported) {
        (Some(b), _) if b.is_finite() => b,
        (Some(_), _) => return Err(ScanError::invalid_bounds()),
        (None, Some(components)) => GeoBounds::from_components(components)?,
        (None, None) => grid
            .bounds
            .ok_or_else(|| ScanError::Resolution("No bounds determined".into()))?,
    };

    if minzoom > maxzoom {
        return Err(ScanError::Resolution("maxzoom must be >= minzoom".into()));
    }
    if maxzoom > grid.max_zoom() {
        return Err(ScanError::Resolution(format!(
            "maxzoom must be <= {}",
            grid.max_zoom()
        )));
    }

    Ok(ResolvedParams {
        bounds,
        minzoom,
        maxzoom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BOUNDS_SHAPE_MESSAGE;
    use crate::grid::RawTileGrid;

    fn grid(bounds: Option<Vec<f64>>) -> TileGrid {
        TileGrid::from_raw(&RawTileGrid {
            srid: Some(2193),
            resolutions: Some(vec![8960.0, 4480.0, 2240.0, 1120.0]),
            origin: Some(vec![-1_000_000.0, 10_000_000.0]),
            tile_size: None,
            bounds,
        })
        .unwrap()
    }

    fn info(bounds: Option<Vec<Option<f64>>>, minzoom: Option<u8>, maxzoom: Option<u8>) -> SourceInfo {
        SourceInfo {
            bounds,
            minzoom,
            maxzoom,
            ..SourceInfo::default()
        }
    }

    #[test]
    fn explicit_values_win() {
        let explicit = ExplicitParams {
            bounds: Some(GeoBounds::new(1.0, 2.0, 3.0, 4.0)),
            minzoom: Some(1),
            maxzoom: Some(2),
        };
        let src = info(Some(vec![Some(0.0); 4]), Some(0), Some(3));
        let p = resolve(&explicit, &grid(None), &src).unwrap();
        assert_eq!(p.bounds, GeoBounds::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!((p.minzoom, p.maxzoom), (1, 2));
    }

    #[test]
    fn source_values_fill_gaps_and_grid_bounds_are_last() {
        let src = info(None, Some(0), Some(3));
        let p = resolve(
            &ExplicitParams::default(),
            &grid(Some(vec![274000.0, 3087000.0, 3327000.0, 7173000.0])),
            &src,
        )
        .unwrap();
        assert_eq!(p.bounds, GeoBounds::new(274000.0, 3087000.0, 3327000.0, 7173000.0));
        assert_eq!((p.minzoom, p.maxzoom), (0, 3));
    }

    #[test]
    fn missing_values_are_resolution_errors() {
        let err = resolve(&ExplicitParams::default(), &grid(None), &info(None, Some(0), Some(1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "No bounds determined");

        let b = Some(vec![Some(0.0), Some(0.0), Some(1.0), Some(1.0)]);
        let err = resolve(&ExplicitParams::default(), &grid(None), &info(b.clone(), None, Some(1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "No minzoom determined");
        let err = resolve(&ExplicitParams::default(), &grid(None), &info(b, Some(0), None))
            .unwrap_err();
        assert!(matches!(err, ScanError::Resolution(_)));
        assert_eq!(err.to_string(), "No maxzoom determined");
    }

    #[test]
    fn malformed_reported_bounds_fail_validation() {
        let src = info(
            Some(vec![None, Some(128379137.0), Some(f64::NAN), None]),
            Some(0),
            Some(3),
        );
        let err = resolve(&ExplicitParams::default(), &grid(None), &src).unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
        assert_eq!(err.to_string(), BOUNDS_SHAPE_MESSAGE);

        let short = info(Some(vec![Some(0.0), Some(0.0)]), Some(0), Some(3));
        assert!(matches!(
            resolve(&ExplicitParams::default(), &grid(None), &short),
            Err(ScanError::Validation(_))
        ));
    }

    #[test]
    fn reported_zoom_range_is_checked_against_grid() {
        let b = Some(vec![Some(0.0), Some(0.0), Some(1.0), Some(1.0)]);
        let err = resolve(&ExplicitParams::default(), &grid(None), &info(b.clone(), Some(0), Some(6)))
            .unwrap_err();
        assert_eq!(err.to_string(), "maxzoom must be <= 3");
        let err = resolve(&ExplicitParams::default(), &grid(None), &info(b, Some(3), Some(1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "maxzoom must be >= minzoom");
    }
}
