//! Tile coordinates in the web mercator tiling scheme.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tilefeed_types::LatLngBounds;

/// Maximum zoom level for which tile indices fit into `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Index of a tile: zoom level and column/row at that level.
///
/// Row `y` grows from north to south.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct TileCoordinate {
    /// Zoom level.
    pub zoom: u8,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileCoordinate {
    /// Creates a new coordinate.
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at the zoom level of this tile.
    pub fn tiles_per_side(&self) -> u64 {
        1u64 << self.zoom.min(MAX_ZOOM)
    }

    /// Returns true if the zoom level is supported and the indices exist at that level.
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM
            && u64::from(self.x) < self.tiles_per_side()
            && u64::from(self.y) < self.tiles_per_side()
    }

    /// Geographic area covered by the tile.
    pub fn bounds(&self) -> LatLngBounds {
        LatLngBounds::from_tile(self.zoom, self.x, self.y)
    }
}

impl Display for TileCoordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
