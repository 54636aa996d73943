//! Overpass JSON response decoding.

use std::collections::HashMap;

use geo::Coord;
use serde::Deserialize;

use super::types::{ProviderError, WayElement};

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: i64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Option<Vec<Option<OverpassGeometryPoint>>>,
}

#[derive(Debug, Deserialize)]
struct OverpassGeometryPoint {
    lat: f64,
    lon: f64,
}

/// Decodes an `out body geom` response into ways.
///
/// Non-way elements and ways without geometry are dropped. Overpass emits
/// `null` for geometry points it could not resolve; those points are skipped.
pub fn parse_ways(body: &[u8]) -> Result<Vec<WayElement>, ProviderError> {
    let response: OverpassResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    Ok(response
        .elements
        .into_iter()
        .filter(|el| el.kind == "way")
        .filter_map(|mut el| {
            let geometry = el.geometry.take()?;
            Some(WayElement {
                id: el.id,
                highway: el.tags.remove("highway"),
                points: geometry
                    .into_iter()
                    .flatten()
                    .map(|p| Coord { x: p.lon, y: p.lat })
                    .collect(),
            })
        })
        .collect())
}
