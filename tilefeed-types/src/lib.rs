//! Geographic value types shared by the `tilefeed` crates.
//!
//! * [`LatLng`](geo::LatLng) is a point on the WGS84 ellipsoid given in degrees.
//! * [`LatLngBounds`](geo::LatLngBounds) is an axis aligned rectangle in geographic
//!   coordinates, used to describe the area covered by a map tile or the region that should be
//!   invalidated.

pub mod error;
pub mod geo;

pub use error::TileFeedTypesError;
pub use geo::{LatLng, LatLngBounds};
