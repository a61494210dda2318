use std::sync::Arc;

use super::CustomGeometrySource;
use crate::error::TileFeedError;
use crate::observer::{DummyObserver, FetchObserver};
use crate::options::{SchedulerOptions, SourceOptions, SupersedePolicy};
use crate::provider::FeatureProvider;
use crate::scheduler::TileScheduler;
use crate::sink::TileSink;
use crate::store::FeatureTileStore;
use crate::tile_coordinate::MAX_ZOOM;

/// Constructor for a [`CustomGeometrySource`].
///
/// ```
/// use std::sync::Arc;
/// use geojson::FeatureCollection;
/// use tilefeed::{CustomGeometrySourceBuilder, FeatureTileStore, ProviderError};
/// use tilefeed_types::LatLngBounds;
///
/// let store = Arc::new(FeatureTileStore::new());
/// let source = CustomGeometrySourceBuilder::new(
///     "buildings",
///     |_bounds: &LatLngBounds, _zoom: u8| -> Result<FeatureCollection, ProviderError> {
///         Ok(FeatureCollection { bbox: None, features: vec![], foreign_members: None })
///     })
///     .with_sink(store.clone())
///     .with_zoom_range(10, 16)
///     .with_worker_count(4)
///     .build()?;
///
/// source.request_tile(12, 2200, 1343)?;
/// # Ok::<(), tilefeed::TileFeedError>(())
/// ```
pub struct CustomGeometrySourceBuilder {
    id: String,
    provider: Arc<dyn FeatureProvider>,
    sink: Option<Arc<dyn TileSink>>,
    observer: Option<Arc<dyn FetchObserver>>,
    scheduler_options: SchedulerOptions,
    source_options: SourceOptions,
}

impl CustomGeometrySourceBuilder {
    /// Initializes a builder for a source with the given id and feature provider.
    pub fn new(id: impl Into<String>, provider: impl FeatureProvider + 'static) -> Self {
        Self::new_with_shared_provider(id, Arc::new(provider))
    }

    /// Same as [`new`](Self::new), for a provider that is shared with other sources.
    pub fn new_with_shared_provider(
        id: impl Into<String>,
        provider: Arc<dyn FeatureProvider>,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            sink: None,
            observer: None,
            scheduler_options: SchedulerOptions::default(),
            source_options: SourceOptions::default(),
        }
    }

    /// Sets the sink receiving fetched tiles.
    ///
    /// Defaults to a new [`FeatureTileStore`].
    pub fn with_sink(mut self, sink: Arc<dyn TileSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the observer notified about finished and rejected requests.
    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sets the number of worker threads. Defaults to 2.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.scheduler_options.worker_count = worker_count;
        self
    }

    /// Sets the number of requests that can wait for a free worker. Defaults to 80.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.scheduler_options.queue_capacity = queue_capacity;
        self
    }

    /// Sets how repeated requests for a tile being fetched are handled.
    pub fn with_supersede_policy(mut self, policy: SupersedePolicy) -> Self {
        self.scheduler_options.supersede_policy = policy;
        self
    }

    /// Replaces all scheduler options.
    pub fn with_scheduler_options(mut self, options: SchedulerOptions) -> Self {
        self.scheduler_options = options;
        self
    }

    /// Sets the zoom levels at which the source provides tiles. Defaults to `0..=18`.
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.source_options.min_zoom = min_zoom;
        self.source_options.max_zoom = max_zoom;
        self
    }

    /// Replaces all source options.
    pub fn with_source_options(mut self, options: SourceOptions) -> Self {
        self.source_options = options;
        self
    }

    /// Consumes the builder, starts the worker threads and constructs the source.
    ///
    /// Will return an error if the options are inconsistent or the workers cannot be started.
    pub fn build(self) -> Result<CustomGeometrySource, TileFeedError> {
        let Self {
            id,
            provider,
            sink,
            observer,
            scheduler_options,
            source_options,
        } = self;

        if source_options.min_zoom > source_options.max_zoom {
            return Err(TileFeedError::InvalidConfiguration(format!(
                "min zoom {} is greater than max zoom {}",
                source_options.min_zoom, source_options.max_zoom
            )));
        }

        if source_options.max_zoom > MAX_ZOOM {
            return Err(TileFeedError::InvalidConfiguration(format!(
                "max zoom cannot be greater than {MAX_ZOOM}"
            )));
        }

        let sink: Arc<dyn TileSink> = match sink {
            Some(sink) => sink,
            None => Arc::new(FeatureTileStore::new()),
        };
        let observer: Arc<dyn FetchObserver> = match observer {
            Some(observer) => observer,
            None => Arc::new(DummyObserver),
        };
        let scheduler = TileScheduler::new(provider, sink.clone(), observer, scheduler_options)?;

        log::info!("Created custom geometry source '{id}'");

        Ok(CustomGeometrySource {
            id,
            options: source_options,
            scheduler,
            sink,
        })
    }
}
