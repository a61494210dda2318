//! Geometries in geographic coordinates (latitude and longitude in degrees).

mod bounds;
mod point;

pub use bounds::LatLngBounds;
pub use point::LatLng;

/// Largest latitude representable in the web mercator tiling scheme.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
