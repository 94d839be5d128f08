use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

/// A latitude/longitude pair as the API stores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One geolocation acquisition. Replaced whole on every successful poll and
/// never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoSample {
    pub coords: Coordinates,
    pub acquired_at: DateTime<Utc>,
}

impl GeoSample {
    pub fn now(coords: Coordinates) -> Self {
        Self {
            coords,
            acquired_at: Utc::now(),
        }
    }
}
