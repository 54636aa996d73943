//! Overpass QL query construction.

use geo::Coord;

use crate::highway;

/// Default server-side query timeout in seconds (`[timeout:N]`).
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 25;

/// Serializes vertices as the flat `"lat lon lat lon ..."` string used by
/// Overpass `poly:` filters.
pub fn poly_string(vertices: &[Coord<f64>]) -> String {
    vertices
        .iter()
        .map(|c| format!("{} {}", c.y, c.x))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the query for every road-or-trail way inside the given region.
///
/// The region is passed as ring vertices in `(x = lon, y = lat)` without a
/// closing duplicate.
pub fn build_way_query(vertices: &[Coord<f64>], timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{}];way[\"highway\"~\"{}\"](poly:\"{}\");out body geom;",
        timeout_secs,
        highway::tag_pattern(),
        poly_string(vertices)
    )
}
