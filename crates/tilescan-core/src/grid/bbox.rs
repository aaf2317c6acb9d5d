//! Per-zoom tile index boxes derived from the grid's own origin and
//! resolutions (top-left pixel origin, y growing southward).

use crate::error::ScanError;

use super::{GeoBounds, TileGrid};

/// Inclusive tile index rectangle at one zoom. Empty when max < min.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomBox {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl ZoomBox {
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Number of cells; 0 for an empty box.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        ((self.max_x - self.min_x + 1) as u64) * ((self.max_y - self.min_y + 1) as u64)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Compute the box covering `bounds` at zoom `z`.
pub fn zoom_box(grid: &TileGrid, z: u8, bounds: &GeoBounds) -> Result<ZoomBox, ScanError> {
    bounds.check_order()?;
    let r = grid
        .resolution(z)
        .ok_or_else(|| ScanError::config(format!("tilegrid has no resolution for zoom {}", z)))?;
    let size = grid.tile_size as f64;
    let (ox, oy) = grid.origin;

    let px_ll = ((bounds.west - ox) / r, (oy - bounds.south) / r);
    let px_ur = ((bounds.east - ox) / r, (oy - bounds.north) / r);

    let bbox = ZoomBox {
        min_x: ((px_ll.0 / size).floor() as i64).max(0),
        min_y: ((px_ur.1 / size).floor() as i64).max(0),
        max_x: ((px_ur.0 - 1.0) / size).floor() as i64,
        max_y: ((px_ll.1 - 1.0) / size).floor() as i64,
    };
    // Widths stay below 2^32 so a box's area fits in a u64.
    if bbox.max_x >= u32::MAX as i64 || bbox.max_y >= u32::MAX as i64 {
        return Err(ScanError::config(format!(
            "bounds exceed the addressable tile range at zoom {}",
            z
        )));
    }
    Ok(bbox)
}

/// Boxes for every zoom in `[minzoom, maxzoom]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomBoxes {
    minzoom: u8,
    boxes: Vec<ZoomBox>,
}

impl ZoomBoxes {
    pub fn minzoom(&self) -> u8 {
        self.minzoom
    }

    pub fn maxzoom(&self) -> u8 {
        self.minzoom + (self.boxes.len() - 1) as u8
    }

    pub fn get(&self, z: u8) -> Option<&ZoomBox> {
        z.checked_sub(self.minzoom)
            .and_then(|i| self.boxes.get(i as usize))
    }

    /// Sum of the box areas over the zoom range. Checked when the boxes are
    /// built, so this cannot overflow.
    pub fn total(&self) -> u64 {
        self.boxes.iter().map(ZoomBox::area).fold(0, u64::saturating_add)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &ZoomBox)> + '_ {
        self.boxes
            .iter()
            .enumerate()
            .map(move |(i, b)| (self.minzoom + i as u8, b))
    }
}

/// Compute boxes for every zoom in `[minzoom, maxzoom]`.
pub fn zoom_boxes(
    grid: &TileGrid,
    minzoom: u8,
    maxzoom: u8,
    bounds: &GeoBounds,
) -> Result<ZoomBoxes, ScanError> {
    if minzoom > maxzoom {
        return Err(ScanError::config("maxzoom must be >= minzoom"));
    }
    let boxes = (minzoom..=maxzoom)
        .map(|z| zoom_box(grid, z, bounds))
        .collect::<Result<Vec<_>, _>>()?;
    boxes
        .iter()
        .try_fold(0u64, |sum, b| sum.checked_add(b.area()))
        .ok_or_else(|| ScanError::config("tile count exceeds the addressable range"))?;
    Ok(ZoomBoxes { minzoom, boxes })
}
