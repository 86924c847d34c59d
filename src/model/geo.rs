use serde::{Deserialize, Serialize};
use validator::Validate;

pub const GEOJSON_POINT: &str = "Point";

/// A location as the domain sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    #[validate(length(min = 1))]
    pub address: String,
}

impl GeoPoint {
    pub fn new<A: Into<String>>(lat: f64, lon: f64, address: A) -> Self {
        GeoPoint {
            lat,
            lon,
            address: address.into(),
        }
    }
}

/// A location as it is persisted: a GeoJSON point plus the free-text address.
///
/// Coordinates are always `[lon, lat]`, for every write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
    pub address: String,
}

impl GeoJsonPoint {
    pub fn lon(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

impl From<&GeoPoint> for GeoJsonPoint {
    fn from(point: &GeoPoint) -> Self {
        GeoJsonPoint {
            kind: GEOJSON_POINT.to_string(),
            coordinates: [point.lon, point.lat],
            address: point.address.clone(),
        }
    }
}

impl From<&GeoJsonPoint> for GeoPoint {
    fn from(point: &GeoJsonPoint) -> Self {
        GeoPoint {
            lat: point.lat(),
            lon: point.lon(),
            address: point.address.clone(),
        }
    }
}
