//! Tile planner
//!
//! Decides how a polygon is split into processing units. Small regions are
//! fetched with one query over the polygon itself; large ones are covered by
//! a grid of fixed-size square tiles, keeping only the tiles that touch the
//! polygon so no request is wasted on empty cells.
//!
//! ```text
//!   bbox.max_y ┌───┬───┬───┬───┐
//!              │ · │ * │ * │ · │   * = tile intersects polygon (kept)
//!              ├───┼───┼───┼───┤   · = discarded before any fetch
//!              │ * │ * │ * │ * │
//!              ├───┼───┼───┼───┤
//!              │ · │ * │ · │ · │
//!   bbox.min_y └───┴───┴───┴───┘
//!          bbox.min_x        bbox.max_x
//! ```
//!
//! Tiles are anchored on the south-west corner of the bounding box and laid
//! out row-major, south to north, west to east.

use geo::Coord;
use thiserror::Error;
use tracing::debug;

use crate::coord::Polygon;
use crate::geometry::{self, BoundingBox};

/// Default area above which the region is tiled (km²).
pub const DEFAULT_AREA_THRESHOLD_KM2: f64 = 60.0;

/// Default tile side length in degrees.
pub const DEFAULT_TILE_SIZE_DEG: f64 = 0.05;

/// Default upper bound on the candidate grid size.
pub const DEFAULT_MAX_TILES: usize = 20_000;

/// Tiling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingConfig {
    /// Regions larger than this (km²) are split into tiles.
    pub area_threshold_km2: f64,
    /// Side length of a tile in degrees.
    pub tile_size_deg: f64,
    /// Maximum number of candidate tiles before planning gives up.
    pub max_tiles: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            area_threshold_km2: DEFAULT_AREA_THRESHOLD_KM2,
            tile_size_deg: DEFAULT_TILE_SIZE_DEG,
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}

/// Errors from tile planning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilePlanError {
    #[error("tile size must be a positive number of degrees, got {0}")]
    InvalidTileSize(f64),

    #[error("{candidates} candidate tiles exceed the limit of {max}")]
    TooManyTiles { candidates: f64, max: usize },
}

/// How the region is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// One query over the whole polygon.
    Single,
    /// One query per intersecting grid tile.
    Tiled,
}

impl std::fmt::Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Tiled => write!(f, "tiled"),
        }
    }
}

/// Grid position of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub row: usize,
    pub col: usize,
}

/// The shape a unit's external query is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRegion {
    /// The request polygon's own vertices.
    Polygon(Vec<Coord<f64>>),
    /// A grid tile.
    Tile(BoundingBox),
}

impl QueryRegion {
    /// Region vertices in ring order, without a closing duplicate.
    pub fn vertices(&self) -> Vec<Coord<f64>> {
        match self {
            Self::Polygon(vertices) => vertices.clone(),
            Self::Tile(bbox) => bbox.corners().to_vec(),
        }
    }
}

/// Cheap midpoint pre-filter attached to each unit.
///
/// Tile filters exclude their east/north edges so that a midpoint on an
/// edge shared by two tiles is claimed once; the outermost column and row
/// keep their far edge closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitFilter {
    pub bbox: BoundingBox,
    pub closed_east: bool,
    pub closed_north: bool,
}

impl UnitFilter {
    /// A filter closed on every edge.
    pub fn closed(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            closed_east: true,
            closed_north: true,
        }
    }

    #[inline]
    pub fn admits(&self, c: Coord<f64>) -> bool {
        self.bbox.contains(c)
            && (self.closed_east || c.x < self.bbox.max_x)
            && (self.closed_north || c.y < self.bbox.max_y)
    }
}

/// One query-and-clip unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingUnit {
    /// Position in the plan, used for logging.
    pub index: usize,
    /// Grid position, `None` in single-query mode.
    pub tile: Option<TileIndex>,
    /// Shape the external query is built from.
    pub region: QueryRegion,
    /// Midpoint pre-filter.
    pub filter: UnitFilter,
}

/// Planner output.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    pub mode: PlanMode,
    pub units: Vec<ProcessingUnit>,
    /// Grid cells considered (1 in single mode).
    pub candidates: usize,
    /// Grid cells dropped because they miss the polygon.
    pub discarded: usize,
}

/// Plans the processing units for a polygon.
pub fn plan(
    polygon: &Polygon,
    bbox: &BoundingBox,
    area_km2: f64,
    config: &TilingConfig,
) -> Result<TilePlan, TilePlanError> {
    if area_km2 <= config.area_threshold_km2 || area_km2.is_nan() {
        return Ok(TilePlan {
            mode: PlanMode::Single,
            units: vec![ProcessingUnit {
                index: 0,
                tile: None,
                region: QueryRegion::Polygon(polygon.vertices().to_vec()),
                filter: UnitFilter::closed(*bbox),
            }],
            candidates: 1,
            discarded: 0,
        });
    }

    let size = config.tile_size_deg;
    if !(size.is_finite() && size > 0.0) {
        return Err(TilePlanError::InvalidTileSize(size));
    }

    let cols = grid_span(bbox.width(), size);
    let rows = grid_span(bbox.height(), size);
    let candidates = cols * rows;
    if !candidates.is_finite() || candidates > config.max_tiles as f64 {
        return Err(TilePlanError::TooManyTiles {
            candidates,
            max: config.max_tiles,
        });
    }
    let (cols, rows) = (cols as usize, rows as usize);

    let mut units = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            // Edges come from the grid index so neighbours share exact values
            let tile_box = BoundingBox::new(
                grid_edge(bbox.min_x, col, size),
                grid_edge(bbox.min_y, row, size),
                grid_edge(bbox.min_x, col + 1, size),
                grid_edge(bbox.min_y, row + 1, size),
            );

            if !geometry::intersects_box(polygon, &tile_box) {
                continue;
            }

            units.push(ProcessingUnit {
                index: units.len(),
                tile: Some(TileIndex { row, col }),
                region: QueryRegion::Tile(tile_box),
                filter: UnitFilter {
                    bbox: tile_box,
                    closed_east: col + 1 == cols,
                    closed_north: row + 1 == rows,
                },
            });
        }
    }

    let candidates = rows * cols;
    let discarded = candidates - units.len();
    debug!(
        rows,
        cols,
        kept = units.len(),
        discarded,
        tile_size = size,
        "Tile grid planned"
    );

    Ok(TilePlan {
        mode: PlanMode::Tiled,
        units,
        candidates,
        discarded,
    })
}

fn grid_edge(origin: f64, step: usize, size: f64) -> f64 {
    origin + step as f64 * size
}

/// Number of tiles needed to cover `extent`, at least one.
fn grid_span(extent: f64, size: f64) -> f64 {
    (extent / size).ceil().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LatLon;
    use crate::geometry::area_km2;

    fn polygon(points: &[(f64, f64)]) -> Polygon {
        let points: Vec<LatLon> = points.iter().map(|&(lat, lon)| LatLon::new(lat, lon)).collect();
        Polygon::from_lat_lon(&points).unwrap()
    }

    fn plan_for(poly: &Polygon, config: &TilingConfig) -> TilePlan {
        let bbox = BoundingBox::of(poly);
        plan(poly, &bbox, area_km2(poly), config).unwrap()
    }

    fn forced_tiling(tile_size_deg: f64) -> TilingConfig {
        TilingConfig {
            area_threshold_km2: 0.0,
            tile_size_deg,
            ..TilingConfig::default()
        }
    }

    #[test]
    fn test_small_area_uses_single_query() {
        let poly = polygon(&[(45.0, 7.0), (45.0, 7.05), (45.05, 7.05), (45.05, 7.0)]);
        let plan = plan_for(&poly, &TilingConfig::default());

        assert_eq!(plan.mode, PlanMode::Single);
        assert_eq!(plan.units.len(), 1);
        assert_eq!(plan.units[0].tile, None);
        assert_eq!(plan.units[0].region, QueryRegion::Polygon(poly.vertices().to_vec()));
    }

    #[test]
    fn test_area_equal_to_threshold_is_single() {
        let poly = polygon(&[(45.0, 7.0), (45.0, 7.05), (45.05, 7.05), (45.05, 7.0)]);
        let bbox = BoundingBox::of(&poly);
        let config = TilingConfig {
            area_threshold_km2: 10.0,
            ..TilingConfig::default()
        };
        let plan = plan(&poly, &bbox, 10.0, &config).unwrap();
        assert_eq!(plan.mode, PlanMode::Single);
    }

    #[test]
    fn test_large_area_is_tiled() {
        // ~0.3° x 0.3° square, well above 60 km²
        let poly = polygon(&[(45.0, 7.0), (45.0, 7.3), (45.3, 7.3), (45.3, 7.0)]);
        let plan = plan_for(&poly, &TilingConfig::default());

        assert_eq!(plan.mode, PlanMode::Tiled);
        // 0.3 / 0.05 rounds up to 6 or 7 columns depending on float error
        assert!(plan.units.len() >= 36);
        assert_eq!(plan.candidates, plan.units.len() + plan.discarded);
    }

    #[test]
    fn test_tiles_missing_polygon_are_discarded() {
        // Thin diagonal triangle: most of the bbox grid is empty
        let poly = polygon(&[(0.0, 0.0), (0.001, 0.0), (0.5, 0.5)]);
        let plan = plan_for(&poly, &forced_tiling(0.05));

        assert!(plan.discarded > 0);
        for unit in &plan.units {
            let QueryRegion::Tile(tile_box) = &unit.region else {
                panic!("expected tile region");
            };
            assert!(geometry::intersects_box(&poly, tile_box));
        }
    }

    #[test]
    fn test_polygon_inside_one_cell_yields_one_tile() {
        let poly = polygon(&[(10.01, 10.01), (10.01, 10.02), (10.02, 10.02)]);
        let bbox = BoundingBox::of(&poly);
        let plan = plan_for(&poly, &forced_tiling(0.05));

        assert_eq!(plan.mode, PlanMode::Tiled);
        assert_eq!(plan.units.len(), 1);
        let QueryRegion::Tile(tile_box) = &plan.units[0].region else {
            panic!("expected tile region");
        };
        assert_eq!(tile_box.min_x, bbox.min_x);
        assert_eq!(tile_box.min_y, bbox.min_y);
    }

    #[test]
    fn test_unit_indices_are_sequential() {
        let poly = polygon(&[(0.0, 0.0), (0.0, 0.2), (0.2, 0.2), (0.2, 0.0)]);
        let plan = plan_for(&poly, &forced_tiling(0.05));
        for (i, unit) in plan.units.iter().enumerate() {
            assert_eq!(unit.index, i);
        }
    }

    #[test]
    fn test_outer_tiles_close_far_edges() {
        let poly = polygon(&[(0.0, 0.0), (0.0, 0.08), (0.08, 0.08), (0.08, 0.0)]);
        let plan = plan_for(&poly, &forced_tiling(0.05));

        assert_eq!(plan.units.len(), 4);
        let north_east = plan
            .units
            .iter()
            .find(|u| u.tile == Some(TileIndex { row: 1, col: 1 }))
            .unwrap();
        assert!(north_east.filter.closed_east && north_east.filter.closed_north);
        let south_west = plan
            .units
            .iter()
            .find(|u| u.tile == Some(TileIndex { row: 0, col: 0 }))
            .unwrap();
        assert!(!south_west.filter.closed_east && !south_west.filter.closed_north);
    }

    #[test]
    fn test_shared_edge_claimed_once() {
        let poly = polygon(&[(0.0, 0.0), (0.0, 0.08), (0.04, 0.08), (0.04, 0.0)]);
        let plan = plan_for(&poly, &forced_tiling(0.05));
        let on_edge = Coord { x: 0.05, y: 0.02 };

        let claims = plan.units.iter().filter(|u| u.filter.admits(on_edge)).count();
        assert_eq!(claims, 1);
    }

    #[test]
    fn test_neighbouring_tiles_share_exact_edges() {
        // 0.5 degree strip starting off-grid; 0.05 degree steps do not add up exactly
        let poly = polygon(&[(45.0, 7.0013), (45.0, 7.5013), (45.5, 7.5013), (45.5, 7.0013)]);
        let plan = plan_for(&poly, &forced_tiling(0.05));
        let tiles: std::collections::HashMap<(usize, usize), BoundingBox> = plan
            .units
            .iter()
            .map(|u| (u.tile.map(|t| (t.row, t.col)).unwrap(), u.filter.bbox))
            .collect();

        let mut pairs = 0;
        for (&(row, col), a) in &tiles {
            if let Some(east) = tiles.get(&(row, col + 1)) {
                assert_eq!(a.max_x.to_bits(), east.min_x.to_bits());
                pairs += 1;
            }
            if let Some(north) = tiles.get(&(row + 1, col)) {
                assert_eq!(a.max_y.to_bits(), north.min_y.to_bits());
                pairs += 1;
            }
        }
        assert!(pairs > 0);

        // Points on interior edges belong to exactly one tile
        for (&(row, col), a) in &tiles {
            if tiles.contains_key(&(row, col + 1)) {
                let edge = Coord {
                    x: a.max_x,
                    y: (a.min_y + a.max_y) / 2.0,
                };
                let claims = plan.units.iter().filter(|u| u.filter.admits(edge)).count();
                assert_eq!(claims, 1);
            }
        }
    }

    #[test]
    fn test_too_many_tiles() {
        let poly = polygon(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let bbox = BoundingBox::of(&poly);
        let config = TilingConfig {
            max_tiles: 100,
            ..TilingConfig::default()
        };
        let err = plan(&poly, &bbox, area_km2(&poly), &config).unwrap_err();
        assert!(matches!(err, TilePlanError::TooManyTiles { max: 100, .. }));
    }

    #[test]
    fn test_invalid_tile_size() {
        let poly = polygon(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let bbox = BoundingBox::of(&poly);
        let err = plan(&poly, &bbox, area_km2(&poly), &forced_tiling(0.0)).unwrap_err();
        assert_eq!(err, TilePlanError::InvalidTileSize(0.0));
    }

    #[test]
    fn test_tile_region_vertices_are_corners() {
        let region = QueryRegion::Tile(BoundingBox::new(1.0, 2.0, 1.5, 2.5));
        let vertices = region.vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0], Coord { x: 1.0, y: 2.0 });
        assert_eq!(vertices[2], Coord { x: 1.5, y: 2.5 });
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_tile_intersects_polygon(
                lat in -60.0f64..60.0,
                lon in -170.0f64..170.0,
                a in 0.01f64..0.4,
                b in 0.01f64..0.4,
                skew in 0.0f64..0.3,
            ) {
                let poly = polygon(&[(lat, lon), (lat + skew, lon + a), (lat + b, lon)]);
                let plan = plan_for(&poly, &forced_tiling(0.05));

                prop_assert!(!plan.units.is_empty());
                for unit in &plan.units {
                    if let QueryRegion::Tile(tile_box) = &unit.region {
                        prop_assert!(geometry::intersects_box(&poly, tile_box));
                    }
                }
            }
        }
    }
}
