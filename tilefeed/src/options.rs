//! Construction time options of sources and schedulers.

use serde::{Deserialize, Serialize};

const DEFAULT_WORKER_COUNT: usize = 2;
const DEFAULT_QUEUE_CAPACITY: usize = 80;
const DEFAULT_MAX_ZOOM: u8 = 18;

/// What happens to a running fetch when the same tile is requested again.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedePolicy {
    /// The old fetch runs to completion and its result is dropped.
    #[default]
    LetRun,
    /// The old fetch is cancelled. It still occupies its worker until the provider call
    /// returns, but the provider is not called if the fetch has not started yet.
    CancelPrevious,
}

/// Options of the [`TileScheduler`](crate::TileScheduler).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerOptions {
    /// Number of worker threads calling the feature provider.
    pub worker_count: usize,
    /// Number of requests that can wait for a free worker. Requests made while the queue is
    /// full are rejected.
    pub queue_capacity: usize,
    /// Handling of repeated requests for a tile that is being fetched.
    pub supersede_policy: SupersedePolicy,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            supersede_policy: SupersedePolicy::default(),
        }
    }
}

/// Options of the [`CustomGeometrySource`](crate::CustomGeometrySource).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Minimum zoom level at which tiles are requested.
    pub min_zoom: u8,
    /// Maximum zoom level at which tiles are requested.
    pub max_zoom: u8,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: SchedulerOptions =
            serde_json::from_str(r#"{"worker_count": 4}"#).expect("valid json");
        assert_eq!(options.worker_count, 4);
        assert_eq!(options.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(options.supersede_policy, SupersedePolicy::LetRun);

        let options: SourceOptions = serde_json::from_str("{}").expect("valid json");
        assert_eq!(options, SourceOptions::default());
    }

    #[test]
    fn policy_uses_snake_case() {
        let options: SchedulerOptions =
            serde_json::from_str(r#"{"supersede_policy": "cancel_previous"}"#)
                .expect("valid json");
        assert_eq!(options.supersede_policy, SupersedePolicy::CancelPrevious);
        assert_eq!(
            serde_json::to_string(&SupersedePolicy::LetRun).expect("serializable"),
            r#""let_run""#
        );
    }
}
