//! Error types used by the crate.

use thiserror::Error;

use crate::tile_coordinate::TileCoordinate;

/// Tilefeed error type.
#[derive(Debug, Error)]
pub enum TileFeedError {
    /// Submission queue of the scheduler is full, the request was rejected.
    #[error("tile request queue is full")]
    QueueFull,
    /// Scheduler was shut down and does not accept new requests.
    #[error("tile scheduler is shut down")]
    ShutDown,
    /// Tile indices are out of range for the tile's zoom level.
    #[error("invalid tile coordinate {0}")]
    InvalidCoordinate(TileCoordinate),
    /// Tile zoom level is outside of the zoom range of the source.
    #[error("tile {coordinate} is outside of zoom range {min_zoom}..={max_zoom}")]
    ZoomOutOfRange {
        /// Requested tile.
        coordinate: TileCoordinate,
        /// Minimum zoom level of the source.
        min_zoom: u8,
        /// Maximum zoom level of the source.
        max_zoom: u8,
    },
    /// Source or scheduler options are inconsistent.
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    /// Failed to start a worker thread.
    #[error("failed to spawn worker thread")]
    Io(#[from] std::io::Error),
}

/// Error returned by a [`FeatureProvider`](crate::provider::FeatureProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
    /// Error reading the underlying data.
    #[error("failed to read features")]
    Io(#[from] std::io::Error),
    /// Provider panicked while producing features.
    #[error("provider panicked: {0}")]
    Panicked(String),
}

impl From<String> for ProviderError {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

impl From<&str> for ProviderError {
    fn from(value: &str) -> Self {
        Self::Generic(value.to_owned())
    }
}
