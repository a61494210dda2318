use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use geojson::FeatureCollection;

use crate::cancellation::CancellationToken;
use crate::error::ProviderError;
use crate::observer::{FetchObserver, FetchOutcome};
use crate::provider::FeatureProvider;
use crate::scheduler::SchedulerShared;
use crate::tile_coordinate::TileCoordinate;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TaskState {
    Created,
    Running,
    Delivered,
    Suppressed,
}

/// Fetches features of one tile on a worker thread.
pub(crate) struct TileFetchTask {
    coordinate: TileCoordinate,
    token: CancellationToken,
    provider: Arc<dyn FeatureProvider>,
    scheduler: Weak<SchedulerShared>,
    observer: Arc<dyn FetchObserver>,
    state: TaskState,
}

impl TileFetchTask {
    pub(crate) fn new(
        coordinate: TileCoordinate,
        token: CancellationToken,
        provider: Arc<dyn FeatureProvider>,
        scheduler: Weak<SchedulerShared>,
        observer: Arc<dyn FetchObserver>,
    ) -> Self {
        Self {
            coordinate,
            token,
            provider,
            scheduler,
            observer,
            state: TaskState::Created,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> TaskState {
        self.state
    }

    /// Runs the task and reports the outcome to the observer.
    pub(crate) fn run(&mut self) -> FetchOutcome {
        debug_assert_eq!(self.state, TaskState::Created, "task can only run once");

        self.state = TaskState::Running;
        let outcome = self.execute();
        self.state = if outcome.is_delivered() {
            TaskState::Delivered
        } else {
            TaskState::Suppressed
        };

        log::trace!("Fetch of tile {} finished: {outcome:?}", self.coordinate);
        let notified = catch_unwind(AssertUnwindSafe(|| {
            self.observer.on_fetch_finished(self.coordinate, &outcome)
        }));
        if let Err(payload) = notified {
            log::error!(
                "Fetch observer panicked on tile {}: {}",
                self.coordinate,
                panic_message(payload.as_ref())
            );
        }

        outcome
    }

    fn execute(&self) -> FetchOutcome {
        // The scheduler must not be kept alive while the provider runs.
        {
            let Some(scheduler) = self.scheduler.upgrade() else {
                return FetchOutcome::SourceDropped;
            };
            if scheduler.is_shut_down() {
                scheduler.release(self.coordinate, &self.token);
                return FetchOutcome::SourceDropped;
            }
            if self.token.is_cancelled() {
                scheduler.release(self.coordinate, &self.token);
                return FetchOutcome::Cancelled;
            }
        }

        let features = match self.fetch() {
            Ok(features) => features,
            Err(err) => {
                log::warn!("Failed to get features for tile {}: {err}", self.coordinate);
                self.release();
                return FetchOutcome::ProviderFailed(err.to_string());
            }
        };

        let Some(scheduler) = self.scheduler.upgrade() else {
            return FetchOutcome::SourceDropped;
        };
        if scheduler.is_shut_down() {
            scheduler.release(self.coordinate, &self.token);
            return FetchOutcome::SourceDropped;
        }

        if self.token.is_cancelled() {
            scheduler.release(self.coordinate, &self.token);
            return FetchOutcome::Cancelled;
        }

        if features.features.is_empty() {
            scheduler.release(self.coordinate, &self.token);
            return FetchOutcome::Empty;
        }

        scheduler.deliver(self.coordinate, &self.token, features)
    }

    fn fetch(&self) -> Result<FeatureCollection, ProviderError> {
        let bounds = self.coordinate.bounds();
        let zoom = self.coordinate.zoom;

        log::trace!("Requesting features for tile {}", self.coordinate);
        catch_unwind(AssertUnwindSafe(|| {
            self.provider.features_for_bounds(&bounds, zoom)
        }))
        .unwrap_or_else(|payload| Err(ProviderError::Panicked(panic_message(payload.as_ref()))))
    }

    fn release(&self) {
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.release(self.coordinate, &self.token);
        }
    }
}

/// Text of a caught panic, if it was raised with a string message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{static_provider, ChannelObserver, ChannelSink, GatedProvider};

    const TILE: TileCoordinate = TileCoordinate::new(5, 1, 1);

    fn task(
        provider: Arc<dyn FeatureProvider>,
        shared: &Arc<SchedulerShared>,
        token: CancellationToken,
    ) -> TileFetchTask {
        let (observer, _) = ChannelObserver::new();
        TileFetchTask::new(TILE, token, provider, Arc::downgrade(shared), observer)
    }

    #[test]
    fn delivers_registered_result() {
        let (sink, delivered) = ChannelSink::new();
        let shared = Arc::new(SchedulerShared::new(sink));
        let token = CancellationToken::new();
        shared.registry().put(TILE, token.clone());

        let mut task = task(static_provider(3), &shared, token);
        assert_eq!(task.state(), TaskState::Created);
        assert_eq!(task.run(), FetchOutcome::Delivered { features: 3 });
        assert_eq!(task.state(), TaskState::Delivered);
        assert_eq!(delivered.try_recv(), Ok((TILE, 3)));
        assert!(shared.registry().is_empty());
    }

    #[test]
    fn cancelled_task_does_not_call_provider() {
        let (sink, delivered) = ChannelSink::new();
        let shared = Arc::new(SchedulerShared::new(sink));
        let token = CancellationToken::new();
        shared.registry().put(TILE, token.clone());
        token.cancel();

        let (provider, _) = GatedProvider::new();
        let mut task = task(provider.clone(), &shared, token);
        assert_eq!(task.run(), FetchOutcome::Cancelled);
        assert_eq!(task.state(), TaskState::Suppressed);
        assert_eq!(provider.call_count(), 0);
        assert!(delivered.try_recv().is_err());
        assert!(shared.registry().is_empty());
    }

    #[test]
    fn unregistered_task_is_stale() {
        let (sink, delivered) = ChannelSink::new();
        let shared = Arc::new(SchedulerShared::new(sink));
        let newer = CancellationToken::new();
        shared.registry().put(TILE, newer.clone());

        let mut task = task(static_provider(3), &shared, CancellationToken::new());
        assert_eq!(task.run(), FetchOutcome::Stale);
        assert!(delivered.try_recv().is_err());
        assert!(shared
            .registry()
            .get(TILE)
            .expect("newer entry kept")
            .same_as(&newer));
    }

    #[test]
    fn empty_result_clears_own_entry() {
        let (sink, delivered) = ChannelSink::new();
        let shared = Arc::new(SchedulerShared::new(sink));
        let token = CancellationToken::new();
        shared.registry().put(TILE, token.clone());

        let mut task = task(static_provider(0), &shared, token);
        assert_eq!(task.run(), FetchOutcome::Empty);
        assert!(delivered.try_recv().is_err());
        assert!(shared.registry().is_empty());
    }

    #[test]
    fn dropped_scheduler_skips_provider() {
        let (sink, delivered) = ChannelSink::new();
        let shared = Arc::new(SchedulerShared::new(sink));
        let (provider, _) = GatedProvider::new();
        let mut task = task(provider.clone(), &shared, CancellationToken::new());
        drop(shared);

        assert_eq!(task.run(), FetchOutcome::SourceDropped);
        assert_eq!(provider.call_count(), 0);
        assert!(delivered.try_recv().is_err());
    }
}
