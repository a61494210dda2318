//! Bounded pool of worker threads fetching tiles.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use geojson::FeatureCollection;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::cancellation::CancellationToken;
use crate::error::TileFeedError;
use crate::observer::{FetchObserver, FetchOutcome};
use crate::options::{SchedulerOptions, SupersedePolicy};
use crate::provider::FeatureProvider;
use crate::registry::TileRequestRegistry;
use crate::sink::TileSink;
use crate::task::{panic_message, TileFetchTask};
use crate::tile_coordinate::TileCoordinate;

/// State shared between the scheduler and its fetch tasks.
///
/// Only the scheduler holds a strong reference. Tasks hold weak ones, so once the scheduler is
/// dropped, results of tasks still running are discarded.
pub(crate) struct SchedulerShared {
    registry: TileRequestRegistry,
    sink: Arc<dyn TileSink>,
    shut_down: AtomicBool,
}

impl SchedulerShared {
    pub(crate) fn new(sink: Arc<dyn TileSink>) -> Self {
        Self {
            registry: TileRequestRegistry::new(),
            sink,
            shut_down: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &TileRequestRegistry {
        &self.registry
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Clears the registry entry of a finished task, unless the tile was requested again.
    pub(crate) fn release(&self, coordinate: TileCoordinate, token: &CancellationToken) {
        self.registry.remove_if(coordinate, token);
    }

    /// Hands the result of a task to the sink, if the task is still the latest one for the
    /// tile.
    pub(crate) fn deliver(
        &self,
        coordinate: TileCoordinate,
        token: &CancellationToken,
        features: FeatureCollection,
    ) -> FetchOutcome {
        if !self.registry.remove_if(coordinate, token) {
            log::debug!("Dropping superseded result for tile {coordinate}");
            return FetchOutcome::Stale;
        }

        if self.is_shut_down() {
            return FetchOutcome::SourceDropped;
        }

        let count = features.features.len();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| {
            self.sink.deliver_tile(coordinate, features)
        })) {
            let message = panic_message(payload.as_ref());
            log::error!("Tile sink panicked on tile {coordinate}: {message}");
            return FetchOutcome::SinkFailed(message);
        }

        log::debug!("Delivered tile {coordinate} with {count} features");
        FetchOutcome::Delivered { features: count }
    }
}

/// Fetches tiles with a fixed number of worker threads.
///
/// Requests are queued in a bounded FIFO queue and picked up by the first free worker. Once the
/// queue is full, new requests are rejected with [`TileFeedError::QueueFull`] instead of
/// blocking the requesting thread.
///
/// Every request gets a [`CancellationToken`] registered for its tile. A fetch result reaches
/// the [`TileSink`] only if the token was not cancelled and is still the one registered for the
/// tile when the provider returns, so a tile requested twice is delivered at most once, with the
/// data of the latest request.
///
/// Dropping the scheduler shuts it down. Fetches already running are not interrupted, but their
/// results are discarded.
pub struct TileScheduler {
    shared: Arc<SchedulerShared>,
    sender: Mutex<Option<mpsc::Sender<TileFetchTask>>>,
    provider: Arc<dyn FeatureProvider>,
    observer: Arc<dyn FetchObserver>,
    options: SchedulerOptions,
}

impl std::fmt::Debug for TileScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileScheduler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TileScheduler {
    /// Creates a new scheduler and starts its workers.
    pub fn new(
        provider: Arc<dyn FeatureProvider>,
        sink: Arc<dyn TileSink>,
        observer: Arc<dyn FetchObserver>,
        options: SchedulerOptions,
    ) -> Result<Self, TileFeedError> {
        if options.worker_count == 0 {
            return Err(TileFeedError::InvalidConfiguration(
                "scheduler needs at least one worker".into(),
            ));
        }

        if options.queue_capacity == 0 {
            return Err(TileFeedError::InvalidConfiguration(
                "queue capacity must be positive".into(),
            ));
        }

        let (sender, receiver) = mpsc::channel(options.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        for index in 0..options.worker_count {
            spawn_worker(index, receiver.clone())?;
        }

        log::debug!(
            "Started tile scheduler with {} workers and queue capacity {}",
            options.worker_count,
            options.queue_capacity
        );

        Ok(Self {
            shared: Arc::new(SchedulerShared::new(sink)),
            sender: Mutex::new(Some(sender)),
            provider,
            observer,
            options,
        })
    }

    /// Options the scheduler was created with.
    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Queues fetching of the tile.
    ///
    /// If the tile is already being fetched, the new request replaces the old one; what happens
    /// to the old fetch is defined by [`SupersedePolicy`].
    ///
    /// Rejected requests are logged and reported to the observer, and leave the previous
    /// request for the tile (if any) in place.
    pub fn request_tile(&self, coordinate: TileCoordinate) -> Result<(), TileFeedError> {
        self.submit(coordinate).or_else(|err| self.reject(coordinate, err))
    }

    /// Logs and reports a request that will not be fetched.
    pub(crate) fn reject(
        &self,
        coordinate: TileCoordinate,
        err: TileFeedError,
    ) -> Result<(), TileFeedError> {
        log::warn!("Tile {coordinate} request rejected: {err}");
        self.observer.on_request_rejected(coordinate, &err);

        Err(err)
    }

    /// Cancels fetching of the tile.
    ///
    /// The fetch is not interrupted, but its result will not be delivered. Returns true if
    /// there was an uncancelled request for the tile.
    pub fn cancel_tile(&self, coordinate: TileCoordinate) -> bool {
        let Some(token) = self.shared.registry.get(coordinate) else {
            return false;
        };

        let cancelled = token.cancel();
        if cancelled {
            log::trace!("Cancelled request for tile {coordinate}");
        }

        cancelled
    }

    /// Returns true if there is a request for the tile that has not finished yet.
    pub fn is_in_flight(&self, coordinate: TileCoordinate) -> bool {
        self.shared.registry.get(coordinate).is_some()
    }

    /// Tiles with requests that have not finished yet.
    pub fn in_flight(&self) -> Vec<TileCoordinate> {
        self.shared.registry.coordinates()
    }

    /// Returns true if there is an unfinished request for the tile that was not cancelled.
    pub fn is_pending(&self, coordinate: TileCoordinate) -> bool {
        self.shared.registry.is_pending(coordinate)
    }

    /// Tiles with unfinished requests that were not cancelled.
    pub fn pending(&self) -> Vec<TileCoordinate> {
        self.shared.registry.pending()
    }

    /// Number of requests that have not finished yet.
    pub fn in_flight_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Returns true if the scheduler no longer accepts requests.
    pub fn is_shut_down(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Stops accepting requests and lets the workers exit once the queue is drained.
    ///
    /// Queued fetches finish without calling the provider, running ones are not delivered.
    /// Worker threads are not joined, so a provider that never returns cannot block the caller.
    pub fn shutdown(&self) {
        if self.shared.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        self.sender.lock().take();
        let cancelled = self.shared.registry.cancel_all();
        log::debug!("Tile scheduler shut down, {cancelled} pending requests cancelled");
    }

    fn submit(&self, coordinate: TileCoordinate) -> Result<(), TileFeedError> {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(TileFeedError::ShutDown);
        };

        let token = CancellationToken::new();
        let task = TileFetchTask::new(
            coordinate,
            token.clone(),
            self.provider.clone(),
            Arc::downgrade(&self.shared),
            self.observer.clone(),
        );

        let replaced = self
            .shared
            .registry
            .register(coordinate, token, || {
                sender.try_send(task).map_err(|err| match err {
                    TrySendError::Full(_) => TileFeedError::QueueFull,
                    TrySendError::Closed(_) => TileFeedError::ShutDown,
                })
            })?;

        if let Some(replaced) = replaced {
            match self.options.supersede_policy {
                SupersedePolicy::LetRun => {
                    log::trace!("Request for tile {coordinate} supersedes a running one");
                }
                SupersedePolicy::CancelPrevious => {
                    if replaced.cancel() {
                        log::trace!("Cancelled superseded request for tile {coordinate}");
                    }
                }
            }
        }

        log::trace!("Queued request for tile {coordinate}");
        Ok(())
    }
}

impl Drop for TileScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(
    index: usize,
    receiver: Arc<Mutex<mpsc::Receiver<TileFetchTask>>>,
) -> Result<(), TileFeedError> {
    thread::Builder::new()
        .name(format!("tilefeed-worker-{index}"))
        .spawn(move || {
            loop {
                let task = receiver.lock().blocking_recv();
                let Some(mut task) = task else {
                    break;
                };

                task.run();
            }

            log::trace!("Tile worker {index} stopped");
        })?;

    Ok(())
}
