//! Segment classification and clipping
//!
//! Each way is cut into consecutive-point segments. A segment is kept when
//! its midpoint passes the unit's box pre-filter and then lies inside the
//! request polygon. Segments crossing the boundary are judged by their
//! midpoint alone; long segments across a concave edge can be misjudged.

use geo::Coord;

use crate::coord::Polygon;
use crate::geometry;
use crate::highway::RoadClass;
use crate::overpass::WayElement;
use crate::tiling::UnitFilter;

/// Two consecutive points of one way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Coord<f64>,
    pub end: Coord<f64>,
    pub class: RoadClass,
}

impl Segment {
    pub fn midpoint(&self) -> Coord<f64> {
        geometry::midpoint(self.start, self.end)
    }

    pub fn length_km(&self) -> f64 {
        geometry::haversine_km(self.start, self.end)
    }

    /// Endpoints as `[[lat, lon], [lat, lon]]`.
    pub fn to_lat_lon(&self) -> [[f64; 2]; 2] {
        [[self.start.y, self.start.x], [self.end.y, self.end.x]]
    }
}

/// Segments retained from one processing unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClippedSegments {
    pub roads: Vec<Segment>,
    pub trails: Vec<Segment>,
    /// Segments dropped by the box pre-filter.
    pub prefiltered: usize,
}

impl ClippedSegments {
    pub fn len(&self) -> usize {
        self.roads.len() + self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.trails.is_empty()
    }

    fn push(&mut self, segment: Segment) {
        match segment.class {
            RoadClass::Road => self.roads.push(segment),
            RoadClass::Trail => self.trails.push(segment),
        }
    }

    /// Moves another unit's segments into this one.
    pub fn merge(&mut self, other: ClippedSegments) {
        self.roads.extend(other.roads);
        self.trails.extend(other.trails);
        self.prefiltered += other.prefiltered;
    }
}

/// Classifies and clips a unit's ways against the polygon.
pub fn clip_ways(ways: &[WayElement], filter: &UnitFilter, polygon: &Polygon) -> ClippedSegments {
    let mut clipped = ClippedSegments::default();

    for way in ways {
        let Some(class) = way.highway.as_deref().and_then(RoadClass::from_tag) else {
            continue;
        };

        for pair in way.points.windows(2) {
            let segment = Segment {
                start: pair[0],
                end: pair[1],
                class,
            };
            let mid = segment.midpoint();

            if !filter.admits(mid) {
                clipped.prefiltered += 1;
                continue;
            }
            if geometry::contains(polygon, mid) {
                clipped.push(segment);
            }
        }
    }

    clipped
}
