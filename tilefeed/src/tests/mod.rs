//! Fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use parking_lot::{Condvar, Mutex};
use tilefeed_types::LatLngBounds;

use crate::error::{ProviderError, TileFeedError};
use crate::observer::{FetchObserver, FetchOutcome};
use crate::provider::FeatureProvider;
use crate::sink::TileSink;
use crate::tile_coordinate::TileCoordinate;

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn point_feature(lng: f64, lat: f64, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn features(count: usize) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: (0..count)
            .map(|i| point_feature(i as f64, 0.0, JsonObject::new()))
            .collect(),
        foreign_members: None,
    }
}

pub fn static_provider(count: usize) -> Arc<dyn FeatureProvider> {
    Arc::new(
        move |_bounds: &LatLngBounds, _zoom: u8| -> Result<FeatureCollection, ProviderError> {
            Ok(features(count))
        },
    )
}

/// Sink forwarding every delivered tile into a channel.
pub struct ChannelSink {
    sender: Mutex<Sender<(TileCoordinate, usize)>>,
}

impl ChannelSink {
    pub fn new() -> (Arc<Self>, Receiver<(TileCoordinate, usize)>) {
        let (sender, receiver) = channel();
        (
            Arc::new(Self {
                sender: Mutex::new(sender),
            }),
            receiver,
        )
    }
}

impl TileSink for ChannelSink {
    fn deliver_tile(&self, coordinate: TileCoordinate, features: FeatureCollection) {
        let _ = self
            .sender
            .lock()
            .send((coordinate, features.features.len()));
    }
}

/// Observer forwarding every event into channels.
pub struct ChannelObserver {
    finished: Mutex<Sender<(TileCoordinate, FetchOutcome)>>,
    rejected: Mutex<Sender<(TileCoordinate, String)>>,
}

pub struct ObserverEvents {
    pub finished: Receiver<(TileCoordinate, FetchOutcome)>,
    pub rejected: Receiver<(TileCoordinate, String)>,
}

impl ObserverEvents {
    pub fn next_finished(&self) -> (TileCoordinate, FetchOutcome) {
        self.finished
            .recv_timeout(TIMEOUT)
            .expect("fetch did not finish in time")
    }
}

impl ChannelObserver {
    pub fn new() -> (Arc<Self>, ObserverEvents) {
        let (finished_sender, finished) = channel();
        let (rejected_sender, rejected) = channel();
        (
            Arc::new(Self {
                finished: Mutex::new(finished_sender),
                rejected: Mutex::new(rejected_sender),
            }),
            ObserverEvents { finished, rejected },
        )
    }
}

impl FetchObserver for ChannelObserver {
    fn on_fetch_finished(&self, coordinate: TileCoordinate, outcome: &FetchOutcome) {
        let _ = self.finished.lock().send((coordinate, outcome.clone()));
    }

    fn on_request_rejected(&self, coordinate: TileCoordinate, error: &TileFeedError) {
        let _ = self.rejected.lock().send((coordinate, error.to_string()));
    }
}

enum Response {
    Features(usize),
    Fail(String),
    Panic,
}

/// Provider that blocks every call until the test releases it.
///
/// Calls are numbered in the order they start. Each started call is announced through the
/// receiver returned by [`GatedProvider::new`].
pub struct GatedProvider {
    started: Mutex<Sender<(usize, u8)>>,
    responses: Mutex<HashMap<usize, Response>>,
    condvar: Condvar,
    calls: AtomicUsize,
}

impl GatedProvider {
    pub fn new() -> (Arc<Self>, Receiver<(usize, u8)>) {
        let (sender, receiver) = channel();
        (
            Arc::new(Self {
                started: Mutex::new(sender),
                responses: Mutex::new(HashMap::new()),
                condvar: Condvar::new(),
                calls: AtomicUsize::new(0),
            }),
            receiver,
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn release(&self, call: usize, features: usize) {
        self.respond(call, Response::Features(features));
    }

    pub fn fail(&self, call: usize, message: &str) {
        self.respond(call, Response::Fail(message.to_string()));
    }

    pub fn panic(&self, call: usize) {
        self.respond(call, Response::Panic);
    }

    fn respond(&self, call: usize, response: Response) {
        self.responses.lock().insert(call, response);
        self.condvar.notify_all();
    }
}

impl FeatureProvider for GatedProvider {
    fn features_for_bounds(
        &self,
        _bounds: &LatLngBounds,
        zoom: u8,
    ) -> Result<FeatureCollection, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.started.lock().send((call, zoom));

        let mut responses = self.responses.lock();
        let response = loop {
            if let Some(response) = responses.remove(&call) {
                break response;
            }

            if self.condvar.wait_for(&mut responses, TIMEOUT).timed_out() {
                return Err(ProviderError::Generic("test call was never released".into()));
            }
        };
        drop(responses);

        match response {
            Response::Features(count) => Ok(features(count)),
            Response::Fail(message) => Err(ProviderError::Generic(message)),
            Response::Panic => panic!("provider exploded"),
        }
    }
}

pub fn wait_started(receiver: &Receiver<(usize, u8)>) -> usize {
    receiver
        .recv_timeout(TIMEOUT)
        .expect("provider was not called in time")
        .0
}
