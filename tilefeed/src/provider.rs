//! Source of feature data for tiles.

use geojson::FeatureCollection;
use tilefeed_types::LatLngBounds;

use crate::error::ProviderError;

/// Application supplied function that returns features inside the given bounds.
///
/// The provider is called from worker threads of the [`TileScheduler`](crate::TileScheduler),
/// possibly for several tiles at the same time, so it must be thread safe. Calls may block for
/// as long as needed, but a call that never returns occupies its worker for the lifetime of the
/// source.
///
/// Any `Fn(&LatLngBounds, u8) -> Result<FeatureCollection, ProviderError>` closure is a
/// provider:
///
/// ```
/// use geojson::FeatureCollection;
/// use tilefeed::FeatureProvider;
///
/// fn assert_provider(_: impl FeatureProvider) {}
///
/// assert_provider(|_bounds: &tilefeed_types::LatLngBounds, _zoom: u8| -> Result<_, tilefeed::ProviderError> {
///     Ok(FeatureCollection {
///         bbox: None,
///         features: vec![],
///         foreign_members: None,
///     })
/// });
/// ```
pub trait FeatureProvider: Send + Sync {
    /// Returns features for the tile covering `bounds` at the given `zoom` level.
    fn features_for_bounds(
        &self,
        bounds: &LatLngBounds,
        zoom: u8,
    ) -> Result<FeatureCollection, ProviderError>;
}

impl<F> FeatureProvider for F
where
    F: Fn(&LatLngBounds, u8) -> Result<FeatureCollection, ProviderError> + Send + Sync,
{
    fn features_for_bounds(
        &self,
        bounds: &LatLngBounds,
        zoom: u8,
    ) -> Result<FeatureCollection, ProviderError> {
        self(bounds, zoom)
    }
}
