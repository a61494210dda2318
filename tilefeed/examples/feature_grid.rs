//! This example builds a source that generates a grid of points for every requested tile and
//! stores the results in a [`FeatureTileStore`].

use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::time::Duration;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use parking_lot::Mutex;
use tilefeed::tilefeed_types::LatLngBounds;
use tilefeed::{
    CustomGeometrySourceBuilder, FeatureTileStore, FetchObserver, FetchOutcome, Filter,
    ProviderError, TileCoordinate, TileFeedError,
};

const GRID_SIZE: usize = 4;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let store = Arc::new(FeatureTileStore::new());
    let (sender, receiver) = channel();

    let source = CustomGeometrySourceBuilder::new("grid", grid_features)
        .with_sink(store.clone())
        .with_observer(Arc::new(LoggingObserver {
            finished: Mutex::new(sender),
        }))
        .with_zoom_range(0, 14)
        .build()
        .expect("failed to build the source");

    let requested = [(3, 4, 2), (3, 5, 2), (3, 4, 3), (3, 5, 3), (15, 0, 0)];
    let mut accepted = 0;
    for (zoom, x, y) in requested {
        match source.request_tile(zoom, x, y) {
            Ok(()) => accepted += 1,
            Err(err) => log::warn!("Tile {zoom}/{x}/{y} was not requested: {err}"),
        }
    }

    for _ in 0..accepted {
        match receiver.recv_timeout(Duration::from_secs(10)) {
            Ok((coordinate, outcome)) => log::info!("Tile {coordinate} finished: {outcome:?}"),
            Err(_) => {
                log::error!("Timed out waiting for tiles");
                break;
            }
        }
    }

    let corner_points = Filter::Eq("corner".into(), true.into());
    let corners = source.query_source_features(Some(&corner_points));
    log::info!(
        "{} tiles stored, {} corner points among them",
        store.len(),
        corners.len()
    );
}

fn grid_features(bounds: &LatLngBounds, zoom: u8) -> Result<FeatureCollection, ProviderError> {
    // Pretend to do some work, so that the pool has a reason to exist.
    std::thread::sleep(Duration::from_millis(50));

    let lat_step = bounds.lat_span() / GRID_SIZE as f64;
    let lng_step = bounds.lng_span() / GRID_SIZE as f64;

    let mut features = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for row in 0..GRID_SIZE {
        for column in 0..GRID_SIZE {
            let lat = bounds.south() + lat_step * (row as f64 + 0.5);
            let lng = bounds.west() + lng_step * (column as f64 + 0.5);

            let mut properties = JsonObject::new();
            properties.insert("zoom".into(), zoom.into());
            properties.insert(
                "corner".into(),
                ((row == 0 || row == GRID_SIZE - 1) && (column == 0 || column == GRID_SIZE - 1))
                    .into(),
            );

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

struct LoggingObserver {
    finished: Mutex<Sender<(TileCoordinate, FetchOutcome)>>,
}

impl FetchObserver for LoggingObserver {
    fn on_fetch_finished(&self, coordinate: TileCoordinate, outcome: &FetchOutcome) {
        let _ = self.finished.lock().send((coordinate, outcome.clone()));
    }

    fn on_request_rejected(&self, coordinate: TileCoordinate, error: &TileFeedError) {
        log::debug!("Request for {coordinate} rejected: {error}");
    }
}
