//! Polygon normalization
//!
//! Callers hand us rings in the map's `[lat, lon]` convention, possibly open.
//! The geometry engine works in `(x = lon, y = lat)` and expects a closed
//! ring, so every request passes through [`Polygon::from_lat_lon_pairs`]
//! before anything else happens.

mod types;

pub use types::{
    LatLon, PolygonError, MAX_LAT, MAX_LON, MIN_DISTINCT_VERTICES, MIN_LAT, MIN_LON,
};

use std::collections::HashSet;

use geo::{Coord, LineString};

/// A closed, validated ring in `(x = lon, y = lat)` order.
///
/// Invariants:
/// - at least [`MIN_DISTINCT_VERTICES`] distinct vertices
/// - `ring.first() == ring.last()`, so `ring.len() >= 4`
///
/// The value is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Coord<f64>>,
    shape: geo::Polygon<f64>,
}

impl Polygon {
    /// Builds a polygon from raw caller pairs.
    ///
    /// Each entry must be exactly `[lat, lon]`. This is the entry point used
    /// by the HTTP and CLI surfaces, where input arrives as loosely typed JSON.
    pub fn from_lat_lon_pairs(pairs: &[Vec<f64>]) -> Result<Self, PolygonError> {
        let points = pairs
            .iter()
            .enumerate()
            .map(|(index, pair)| match pair.as_slice() {
                [lat, lon] => Ok(LatLon::new(*lat, *lon)),
                _ => Err(PolygonError::MalformedPair {
                    index,
                    len: pair.len(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_lat_lon(&points)
    }

    /// Builds a polygon from typed positions, closing the ring if needed.
    pub fn from_lat_lon(points: &[LatLon]) -> Result<Self, PolygonError> {
        for (index, p) in points.iter().enumerate() {
            if !p.lat.is_finite() || !p.lon.is_finite() {
                return Err(PolygonError::NonFinite { index });
            }
            if !(MIN_LAT..=MAX_LAT).contains(&p.lat) || !(MIN_LON..=MAX_LON).contains(&p.lon) {
                return Err(PolygonError::OutOfRange {
                    index,
                    lat: p.lat,
                    lon: p.lon,
                });
            }
        }

        let distinct = count_distinct(points);
        if distinct < MIN_DISTINCT_VERTICES {
            return Err(PolygonError::TooFewPoints { distinct });
        }

        let mut ring: Vec<Coord<f64>> = points.iter().map(|&p| Coord::from(p)).collect();
        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }

        let shape = geo::Polygon::new(LineString::new(ring.clone()), vec![]);
        Ok(Self { ring, shape })
    }

    /// The closed ring, first vertex repeated at the end.
    pub fn ring(&self) -> &[Coord<f64>] {
        &self.ring
    }

    /// The ring without its closing duplicate.
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.ring[..self.ring.len() - 1]
    }

    /// The polygon as a `geo` geometry.
    pub fn as_geo(&self) -> &geo::Polygon<f64> {
        &self.shape
    }
}

/// Counts distinct vertices, treating `-0.0` and `0.0` as the same value.
fn count_distinct(points: &[LatLon]) -> usize {
    points
        .iter()
        .map(|p| ((p.lat + 0.0).to_bits(), (p.lon + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}
