//! Hooks to observe what happens to tile requests.

use crate::error::TileFeedError;
use crate::tile_coordinate::TileCoordinate;

/// Final state of a tile fetch task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Features were handed to the tile sink.
    Delivered {
        /// Number of delivered features.
        features: usize,
    },
    /// The request was cancelled before the result could be delivered.
    Cancelled,
    /// Provider returned no features for the tile.
    Empty,
    /// A newer request for the same tile was made while this one was running.
    Stale,
    /// Provider returned an error or panicked.
    ProviderFailed(String),
    /// The source was destroyed before the result could be delivered.
    SourceDropped,
    /// The tile sink panicked while accepting the features.
    SinkFailed(String),
}

impl FetchOutcome {
    /// Returns true if the features reached the tile sink.
    pub fn is_delivered(&self) -> bool {
        matches!(self, FetchOutcome::Delivered { .. })
    }
}

/// Receives notifications about tile requests.
///
/// Methods are called from the thread that caused the event: worker threads for finished
/// fetches and the requesting thread for rejected requests. Every accepted request produces
/// exactly one [`on_fetch_finished`](FetchObserver::on_fetch_finished) call, unless its worker
/// is blocked forever by the provider.
pub trait FetchObserver: Send + Sync {
    /// Fetch task for the tile has finished with the given outcome.
    fn on_fetch_finished(&self, coordinate: TileCoordinate, outcome: &FetchOutcome);

    /// Request for the tile was not accepted.
    fn on_request_rejected(&self, _coordinate: TileCoordinate, _error: &TileFeedError) {}
}

/// Observer that ignores all events.
pub struct DummyObserver;

impl FetchObserver for DummyObserver {
    fn on_fetch_finished(&self, _coordinate: TileCoordinate, _outcome: &FetchOutcome) {}
}
