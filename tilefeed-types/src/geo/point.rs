use serde::{Deserialize, Serialize};

/// 2d point on the surface of the Earth.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    /// Creates a new point from latitude and longitude in degrees.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// Creates a new [`LatLng`] from latitude and longitude values (in degrees).
///
/// ```
/// use tilefeed_types::latlng;
///
/// let point = latlng!(38.0, 52.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! latlng {
    ($lat:expr, $lng:expr) => {
        $crate::geo::LatLng::new($lat, $lng)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn macro_takes_latitude_first() {
        let point = latlng!(-33.9, 151.2);
        assert_eq!(point.lat(), -33.9);
        assert_eq!(point.lng(), 151.2);
    }
}
