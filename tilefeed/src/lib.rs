//! Tilefeed supplies map features to a renderer tile by tile, on demand.
//!
//! Instead of loading a whole dataset up front, the application implements a
//! [`FeatureProvider`] that returns features for a geographic area, and the renderer asks a
//! [`CustomGeometrySource`] for the tiles it is about to draw:
//!
//! ```no_run
//! use std::sync::Arc;
//! use geojson::FeatureCollection;
//! use tilefeed::{CustomGeometrySourceBuilder, FeatureTileStore, ProviderError};
//! use tilefeed_types::LatLngBounds;
//!
//! fn load_features(bounds: &LatLngBounds, zoom: u8) -> Result<FeatureCollection, ProviderError> {
//!     // query a database, a file, a remote service...
//!     # unimplemented!()
//! }
//!
//! let store = Arc::new(FeatureTileStore::new());
//! let source = CustomGeometrySourceBuilder::new("poi", load_features)
//!     .with_sink(store.clone())
//!     .build()?;
//!
//! source.request_tile(14, 8802, 5373)?;
//! // the map moved away before the tile was loaded
//! source.cancel_tile(14, 8802, 5373);
//! # Ok::<(), tilefeed::TileFeedError>(())
//! ```
//!
//! # How tiles are fetched
//!
//! Every source owns a [`TileScheduler`]: a fixed number of worker threads reading requests
//! from a bounded queue. Provider calls happen only on these threads, so a slow provider never
//! blocks the thread requesting tiles. When the queue is full, requests are rejected with
//! [`TileFeedError::QueueFull`].
//!
//! Each accepted request is tracked by a [`CancellationToken`] registered for its tile.
//! Features are handed to the [`TileSink`] only when the provider returns a non-empty
//! collection, the request was not cancelled, and no newer request for the same tile was made
//! in the meantime. Whatever happens to a request is reported to the [`FetchObserver`] and
//! logged through the `log` facade; the renderer itself never receives errors.
//!
//! Provider calls cannot be interrupted. Cancelling a request that is already being fetched only
//! prevents its delivery, and a provider call that never returns occupies its worker until the
//! process exits.

pub mod error;
pub mod filter;
pub mod observer;
pub mod options;
pub mod provider;
pub mod sink;
pub mod source;
pub mod store;
pub mod tile_coordinate;

mod cancellation;
mod registry;
mod scheduler;
mod task;

#[cfg(test)]
mod tests;

pub use cancellation::CancellationToken;
pub use error::{ProviderError, TileFeedError};
pub use filter::{Filter, GeometryKind};
pub use observer::{DummyObserver, FetchObserver, FetchOutcome};
pub use options::{SchedulerOptions, SourceOptions, SupersedePolicy};
pub use provider::FeatureProvider;
pub use registry::TileRequestRegistry;
pub use scheduler::TileScheduler;
pub use sink::TileSink;
pub use source::{CustomGeometrySource, CustomGeometrySourceBuilder};
pub use store::FeatureTileStore;
pub use tile_coordinate::TileCoordinate;

// Reexport tilefeed_types
pub use tilefeed_types;
