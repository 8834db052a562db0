/* src/location.rs */

use serde::{Deserialize, Serialize};

/// Latitude of the fallback location (Stockholm).
pub const FALLBACK_LATITUDE: f64 = 59.3294;
/// Longitude of the fallback location (Stockholm).
pub const FALLBACK_LONGITUDE: f64 = 18.0687;
/// City of the fallback location.
pub const FALLBACK_CITY: &str = "Stockholm";

/// A latitude/longitude pair plus a city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
}

impl Location {
    /// Create a new location.
    pub fn new(latitude: f64, longitude: f64, city: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            city: city.into(),
        }
    }

    /// The location used whenever none could be determined.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_LATITUDE, FALLBACK_LONGITUDE, FALLBACK_CITY)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::fallback()
    }
}
