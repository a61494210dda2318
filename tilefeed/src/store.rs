//! In-memory storage of delivered tiles.

use std::collections::HashMap;

use geojson::{Feature, FeatureCollection};
use parking_lot::RwLock;
use tilefeed_types::LatLngBounds;

use crate::filter::Filter;
use crate::sink::TileSink;
use crate::tile_coordinate::TileCoordinate;

/// Tile sink that keeps delivered tiles in memory.
///
/// Can be used directly as the data store of a renderer, or wrapped by a sink that forwards
/// the tiles further.
#[derive(Debug, Default)]
pub struct FeatureTileStore {
    tiles: RwLock<HashMap<TileCoordinate, FeatureCollection, ahash::RandomState>>,
}

impl FeatureTileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Features of the tile, if it was delivered.
    pub fn tile(&self, coordinate: TileCoordinate) -> Option<FeatureCollection> {
        self.tiles.read().get(&coordinate).cloned()
    }

    /// Returns true if the tile is stored.
    pub fn contains(&self, coordinate: TileCoordinate) -> bool {
        self.tiles.read().contains_key(&coordinate)
    }

    /// Coordinates of all stored tiles, in no particular order.
    pub fn coordinates(&self) -> Vec<TileCoordinate> {
        self.tiles.read().keys().copied().collect()
    }

    /// Number of stored tiles.
    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    /// Returns true if no tiles are stored.
    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }
}

impl TileSink for FeatureTileStore {
    fn deliver_tile(&self, coordinate: TileCoordinate, features: FeatureCollection) {
        if self.tiles.write().insert(coordinate, features).is_some() {
            log::trace!("Replaced stored tile {coordinate}");
        }
    }

    fn invalidate_tile(&self, coordinate: TileCoordinate) -> bool {
        self.tiles.write().remove(&coordinate).is_some()
    }

    fn invalidate_region(&self, bounds: &LatLngBounds) -> Vec<TileCoordinate> {
        let mut tiles = self.tiles.write();
        let affected: Vec<_> = tiles
            .keys()
            .filter(|coordinate| coordinate.bounds().intersects(bounds))
            .copied()
            .collect();

        for coordinate in &affected {
            tiles.remove(coordinate);
        }

        affected
    }

    /// Features of the same object are returned once per tile they were delivered with.
    fn query_features(&self, filter: Option<&Filter>) -> Vec<Feature> {
        self.tiles
            .read()
            .values()
            .flat_map(|collection| collection.features.iter())
            .filter(|feature| filter.map_or(true, |filter| filter.matches(feature)))
            .cloned()
            .collect()
    }
}
