use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{LatLng, MAX_MERCATOR_LAT};
use crate::error::TileFeedTypesError;

/// Rectangle in geographic coordinates.
///
/// Bounds never cross the antimeridian: `west <= east` and `south <= north` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl LatLngBounds {
    /// Creates bounds from the south-west and north-east corners.
    ///
    /// Returns an error if the corners are swapped or any coordinate is not finite.
    pub fn new(south_west: LatLng, north_east: LatLng) -> Result<Self, TileFeedTypesError> {
        let values = [
            south_west.lat(),
            south_west.lng(),
            north_east.lat(),
            north_east.lng(),
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TileFeedTypesError::InvalidBounds(format!(
                "coordinates must be finite: {south_west:?}, {north_east:?}"
            )));
        }

        if south_west.lat() > north_east.lat() || south_west.lng() > north_east.lng() {
            return Err(TileFeedTypesError::InvalidBounds(format!(
                "south-west corner {south_west:?} is not below and left of {north_east:?}"
            )));
        }

        Ok(Self {
            south: south_west.lat(),
            west: south_west.lng(),
            north: north_east.lat(),
            east: north_east.lng(),
        })
    }

    /// Bounds covering the whole area of the web mercator tiling scheme.
    pub fn world() -> Self {
        Self {
            south: -MAX_MERCATOR_LAT,
            west: -180.0,
            north: MAX_MERCATOR_LAT,
            east: 180.0,
        }
    }

    /// Area covered by the web mercator tile with the given zoom level and indices.
    ///
    /// Tile `y` index grows from north to south. Indices are not checked against the zoom
    /// level, so indices outside of `0..2^zoom` give bounds outside of the world area.
    pub fn from_tile(zoom: u8, x: u32, y: u32) -> Self {
        let n = f64::from(zoom).exp2();
        Self {
            south: tile_lat(f64::from(y) + 1.0, n),
            west: tile_lng(f64::from(x), n),
            north: tile_lat(f64::from(y), n),
            east: tile_lng(f64::from(x) + 1.0, n),
        }
    }

    /// Southern latitude.
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Western longitude.
    pub fn west(&self) -> f64 {
        self.west
    }

    /// Northern latitude.
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Eastern longitude.
    pub fn east(&self) -> f64 {
        self.east
    }

    /// South-west corner.
    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }

    /// North-east corner.
    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    /// Returns true if the two bounds share some area.
    ///
    /// Bounds that only touch along an edge do not intersect, so neighbouring tiles never
    /// intersect each other.
    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        self.west < other.east
            && other.west < self.east
            && self.south < other.north
            && other.south < self.north
    }
}

fn tile_lng(x: f64, n: f64) -> f64 {
    x / n * 360.0 - 180.0
}

fn tile_lat(y: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}
