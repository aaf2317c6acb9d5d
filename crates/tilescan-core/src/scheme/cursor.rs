//! Raster-with-zoom-descent enumeration position.
//!
//! Row-major within a zoom, zooms ascending from minzoom to maxzoom; every
//! cell of every box is visited exactly once and empty boxes are passed over.

use crate::grid::ZoomBoxes;
use crate::source::TileCoord;

#[derive(Debug, Clone)]
pub struct Cursor {
    boxes: ZoomBoxes,
    /// `None` once exhausted.
    pos: Option<(u8, i64, i64)>,
}

impl Cursor {
    /// Starts one column left of the first cell so the first advance lands on it.
    pub fn new(boxes: ZoomBoxes) -> Self {
        let z = boxes.minzoom();
        let pos = boxes.get(z).map(|b| (z, b.min_x - 1, b.min_y));
        Self { boxes, pos }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos.is_none()
    }

    /// Move to the next cell and return it; `None` once past maxzoom.
    pub fn advance(&mut self) -> Option<TileCoord> {
        let (mut z, mut x, mut y) = self.pos?;
        let bbox = *self.boxes.get(z)?;

        x += 1;
        if x > bbox.max_x {
            x = bbox.min_x;
            y += 1;
        }
        if y > bbox.max_y || bbox.is_empty() {
            loop {
                z = match z.checked_add(1) {
                    Some(next) if next <= self.boxes.maxzoom() => next,
                    _ => {
                        self.pos = None;
                        return None;
                    }
                };
                let next = self.boxes.get(z)?;
                if !next.is_empty() {
                    x = next.min_x;
                    y = next.min_y;
                    break;
                }
            }
        }

        self.pos = Some((z, x, y));
        Some(TileCoord::new(z, x as u32, y as u32))
    }
}

impl Iterator for Cursor {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        self.advance()
    }
}
