//! Tile source backed by an application feature provider.

use std::sync::Arc;

use geojson::Feature;
use tilefeed_types::LatLngBounds;

use crate::error::TileFeedError;
use crate::filter::Filter;
use crate::options::SourceOptions;
use crate::scheduler::TileScheduler;
use crate::sink::TileSink;
use crate::tile_coordinate::TileCoordinate;

mod builder;

pub use builder::CustomGeometrySourceBuilder;

/// Source of map features supplied tile by tile by a [`FeatureProvider`](crate::FeatureProvider).
///
/// The renderer calls [`request_tile`](Self::request_tile) for every tile it needs and
/// [`cancel_tile`](Self::cancel_tile) for tiles it no longer needs. Features are fetched on the
/// worker threads of the source's [`TileScheduler`] and handed to the [`TileSink`].
///
/// Use [`CustomGeometrySourceBuilder`] to create a source. Dropping the source shuts down its
/// scheduler; results of fetches still running are discarded.
pub struct CustomGeometrySource {
    id: String,
    options: SourceOptions,
    scheduler: TileScheduler,
    sink: Arc<dyn TileSink>,
}

impl std::fmt::Debug for CustomGeometrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomGeometrySource")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl CustomGeometrySource {
    /// Identifier of the source.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Options the source was created with.
    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    /// Scheduler fetching the tiles of this source.
    pub fn scheduler(&self) -> &TileScheduler {
        &self.scheduler
    }

    /// Sink receiving the tiles of this source.
    pub fn sink(&self) -> &Arc<dyn TileSink> {
        &self.sink
    }

    /// Queues fetching of the tile.
    ///
    /// Tiles outside of the source zoom range, or with indices that do not exist at their zoom
    /// level, are rejected.
    pub fn request_tile(&self, zoom: u8, x: u32, y: u32) -> Result<(), TileFeedError> {
        let coordinate = TileCoordinate::new(zoom, x, y);
        match self.validate(coordinate) {
            Ok(()) => self.scheduler.request_tile(coordinate),
            Err(err) => self.scheduler.reject(coordinate, err),
        }
    }

    /// Cancels fetching of the tile. Returns true if a pending request was cancelled.
    pub fn cancel_tile(&self, zoom: u8, x: u32, y: u32) -> bool {
        self.scheduler.cancel_tile(TileCoordinate::new(zoom, x, y))
    }

    /// Drops the data of the tile and fetches it again.
    ///
    /// The tile is only requested again if the sink held data for it or it was being fetched
    /// and not cancelled. Returns true if the tile was requested.
    pub fn invalidate_tile(&self, zoom: u8, x: u32, y: u32) -> Result<bool, TileFeedError> {
        let coordinate = TileCoordinate::new(zoom, x, y);
        self.validate(coordinate)?;

        let stored = self.sink.invalidate_tile(coordinate);
        if !stored && !self.scheduler.is_pending(coordinate) {
            return Ok(false);
        }

        log::debug!("Invalidated tile {coordinate}");
        self.scheduler.request_tile(coordinate)?;

        Ok(true)
    }

    /// Drops data of all tiles intersecting the bounds at all zoom levels and fetches them
    /// again, together with the tiles in the bounds that are being fetched right now. Cancelled
    /// requests are not restarted.
    ///
    /// Returns the tiles that were requested again.
    pub fn invalidate_region(&self, bounds: &LatLngBounds) -> Vec<TileCoordinate> {
        let mut affected = self.sink.invalidate_region(bounds);
        for coordinate in self.scheduler.pending() {
            if coordinate.bounds().intersects(bounds) && !affected.contains(&coordinate) {
                affected.push(coordinate);
            }
        }

        log::debug!(
            "Invalidating {} tiles in region {bounds:?} of source {}",
            affected.len(),
            self.id
        );

        affected
            .into_iter()
            .filter(|coordinate| {
                self.request_tile(coordinate.zoom, coordinate.x, coordinate.y)
                    .is_ok()
            })
            .collect()
    }

    /// Features of the loaded tiles matching the filter.
    pub fn query_source_features(&self, filter: Option<&Filter>) -> Vec<Feature> {
        self.sink.query_features(filter)
    }

    fn validate(&self, coordinate: TileCoordinate) -> Result<(), TileFeedError> {
        if !coordinate.is_valid() {
            return Err(TileFeedError::InvalidCoordinate(coordinate));
        }

        if coordinate.zoom < self.options.min_zoom || coordinate.zoom > self.options.max_zoom {
            return Err(TileFeedError::ZoomOutOfRange {
                coordinate,
                min_zoom: self.options.min_zoom,
                max_zoom: self.options.max_zoom,
            });
        }

        Ok(())
    }
}
