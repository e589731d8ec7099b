//! Tile Layout
//!
//! Display walls built from a grid of physical screens, one per rank.

use crate::Viewport;

/// Grid of physical displays. Tiles are numbered row-major from the
/// top-left, so rank 0 drives the top-left screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub columns: u32,
    pub rows: u32,
}

impl TileLayout {
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of tiles in the wall
    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Region of the whole wall covered by `rank`'s display
    pub fn tile_viewport(&self, rank: usize) -> Option<Viewport> {
        if rank >= self.tile_count() {
            return None;
        }
        let col = (rank % self.columns as usize) as f64;
        let row = (rank / self.columns as usize) as f64;
        let (cols, rows) = (self.columns as f64, self.rows as f64);

        Some(Viewport {
            xmin: col / cols,
            xmax: (col + 1.0) / cols,
            ymin: 1.0 - (row + 1.0) / rows,
            ymax: 1.0 - row / rows,
        })
    }

    /// Pixel size of the whole wall when every display is `width`x`height`
    pub fn wall_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width * self.columns, height * self.rows)
    }
}
