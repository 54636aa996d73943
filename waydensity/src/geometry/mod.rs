//! Geometry calculator
//!
//! Area, bounding boxes, great-circle lengths and containment tests over
//! [`Polygon`] rings. Area, haversine length and point-in-polygon come
//! from `geo`.

use geo::{ChamberlainDuquetteArea, Coord, Distance, Haversine, Intersects, Point, Rect};

use crate::coord::Polygon;

/// Meters per kilometer.
const M_PER_KM: f64 = 1_000.0;

/// Square meters per square kilometer.
const M2_PER_KM2: f64 = 1_000_000.0;

/// Axis-aligned bounding box in `(x = lon, y = lat)` degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates a box from its corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every coordinate. Returns `None` for no input.
    pub fn from_coords(coords: &[Coord<f64>]) -> Option<Self> {
        let first = coords.first()?;
        let init = Self::new(first.x, first.y, first.x, first.y);
        Some(coords.iter().fold(init, |b, c| {
            Self::new(
                b.min_x.min(c.x),
                b.min_y.min(c.y),
                b.max_x.max(c.x),
                b.max_y.max(c.y),
            )
        }))
    }

    /// Bounding box of a polygon's ring.
    pub fn of(polygon: &Polygon) -> Self {
        // A Polygon always has at least four ring vertices.
        let first = polygon.ring()[0];
        Self::from_coords(polygon.ring())
            .unwrap_or_else(|| Self::new(first.x, first.y, first.x, first.y))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive containment on every edge.
    #[inline]
    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// The box corners counter-clockwise from south-west.
    pub fn corners(&self) -> [Coord<f64>; 4] {
        [
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
            Coord {
                x: self.min_x,
                y: self.max_y,
            },
        ]
    }

    /// The box as a `geo` rectangle.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }
}

/// Spherical area of the polygon in km².
///
/// Uses the Chamberlain–Duquette formula on the WGS84 equatorial radius.
/// A degenerate ring yields `0.0`, which is not an error at this stage.
pub fn area_km2(polygon: &Polygon) -> f64 {
    polygon.as_geo().chamberlain_duquette_unsigned_area() / M2_PER_KM2
}

/// Great-circle distance between two `(lon, lat)` coordinates in km.
#[inline]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b)) / M_PER_KM
}

/// Planar midpoint of two coordinates.
#[inline]
pub fn midpoint(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Whether `c` lies inside the polygon. Points on the boundary count as inside.
#[inline]
pub fn contains(polygon: &Polygon, c: Coord<f64>) -> bool {
    polygon.as_geo().intersects(&c)
}

/// Whether any part of the box touches the polygon.
pub fn intersects_box(polygon: &Polygon, bbox: &BoundingBox) -> bool {
    polygon.as_geo().intersects(&bbox.to_rect())
}
