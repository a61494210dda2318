//! Errors raised by the geographic types.

use thiserror::Error;

/// Failure to build a geographic value from raw coordinates.
#[derive(Debug, Error)]
pub enum TileFeedTypesError {
    /// Bounds with the given corners cannot be constructed.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
}
