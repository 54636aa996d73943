//! Length and density aggregation
//!
//! Sums segment lengths per class, derives densities against the polygon
//! area, and decides whether the segment geometry is small enough to return.
//! Overlapping or duplicated segments are summed as-is.

use serde::Serialize;

use crate::clip::{ClippedSegments, Segment};

/// Default combined length (km) above which geometry is left out.
pub const DEFAULT_MAX_GEOMETRY_KM: f64 = 1500.0;

/// A segment as `[[lat, lon], [lat, lon]]`.
pub type SegmentCoords = [[f64; 2]; 2];

/// Final result for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaReport {
    /// Polygon area in km².
    #[serde(rename = "area")]
    pub area_km2: f64,
    pub total_km_roads: f64,
    pub total_km_trails: f64,
    pub total_km: f64,
    /// `None` (JSON `null`) when the area is zero.
    pub density_roads: Option<f64>,
    pub density_trails: Option<f64>,
    pub density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roads: Option<Vec<SegmentCoords>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trails: Option<Vec<SegmentCoords>>,
    /// Set when `roads`/`trails` were dropped by the size guard.
    pub geometry_omitted: bool,
}

/// Builds the report from the merged segments of every unit.
pub fn aggregate(area_km2: f64, segments: &ClippedSegments, max_geometry_km: f64) -> AreaReport {
    let total_km_roads = total_length_km(&segments.roads);
    let total_km_trails = total_length_km(&segments.trails);
    let total_km = total_km_roads + total_km_trails;

    let geometry_omitted = total_km > max_geometry_km;
    let (roads, trails) = if geometry_omitted {
        (None, None)
    } else {
        (Some(to_coords(&segments.roads)), Some(to_coords(&segments.trails)))
    };

    AreaReport {
        area_km2,
        total_km_roads,
        total_km_trails,
        total_km,
        density_roads: density(total_km_roads, area_km2),
        density_trails: density(total_km_trails, area_km2),
        density: density(total_km, area_km2),
        roads,
        trails,
        geometry_omitted,
    }
}

pub fn total_length_km(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::length_km).sum()
}

/// `length / area`, or `None` for a degenerate area.
fn density(length_km: f64, area_km2: f64) -> Option<f64> {
    if area_km2 > 0.0 && area_km2.is_finite() {
        Some(length_km / area_km2)
    } else {
        None
    }
}

fn to_coords(segments: &[Segment]) -> Vec<SegmentCoords> {
    segments.iter().map(Segment::to_lat_lon).collect()
}
