//! Coordinate types and validation errors.

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Minimum number of distinct vertices for a usable ring.
pub const MIN_DISTINCT_VERTICES: usize = 3;

/// A geographic position in the map's latitude-first convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl LatLon {
    /// Creates a new position.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns the position as a `[lat, lon]` pair.
    pub fn to_pair(self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

impl From<geo::Coord<f64>> for LatLon {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lon: coord.x,
        }
    }
}

impl From<LatLon> for geo::Coord<f64> {
    fn from(pos: LatLon) -> Self {
        geo::Coord {
            x: pos.lon,
            y: pos.lat,
        }
    }
}

/// Errors raised while turning caller input into a [`Polygon`](super::Polygon).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolygonError {
    /// A vertex was not a `[lat, lon]` pair.
    #[error("vertex {index} has {len} components, expected [lat, lon]")]
    MalformedPair { index: usize, len: usize },

    /// A vertex contained NaN or infinity.
    #[error("vertex {index} is not a finite coordinate")]
    NonFinite { index: usize },

    /// A vertex lies outside the valid latitude/longitude range.
    #[error("vertex {index} out of range: lat {lat}, lon {lon}")]
    OutOfRange { index: usize, lat: f64, lon: f64 },

    /// Not enough distinct vertices to enclose an area.
    #[error("polygon needs at least 3 distinct points, got {distinct}")]
    TooFewPoints { distinct: usize },
}
