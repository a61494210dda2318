//! Renderer side of the tile exchange.

use geojson::{Feature, FeatureCollection};
use tilefeed_types::LatLngBounds;

use crate::filter::Filter;
use crate::tile_coordinate::TileCoordinate;

/// Receiver of fetched tiles, usually the tile cache of a map renderer.
///
/// Only [`deliver_tile`](TileSink::deliver_tile) is required. The other methods let a
/// [`CustomGeometrySource`](crate::CustomGeometrySource) invalidate and query the data the sink
/// holds; the default implementations assume the sink keeps nothing.
pub trait TileSink: Send + Sync {
    /// Accepts features of a tile. Called from worker threads.
    fn deliver_tile(&self, coordinate: TileCoordinate, features: FeatureCollection);

    /// Drops the data of the tile. Returns true if the tile was stored.
    fn invalidate_tile(&self, _coordinate: TileCoordinate) -> bool {
        false
    }

    /// Drops the data of all tiles intersecting the bounds, at all zoom levels, and returns
    /// their coordinates.
    fn invalidate_region(&self, _bounds: &LatLngBounds) -> Vec<TileCoordinate> {
        vec![]
    }

    /// Features of all stored tiles matching the filter.
    fn query_features(&self, _filter: Option<&Filter>) -> Vec<Feature> {
        vec![]
    }
}
