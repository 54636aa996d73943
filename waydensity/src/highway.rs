//! Highway tag classification.
//!
//! OpenStreetMap `highway=*` values are split into two closed sets. Anything
//! outside both sets is not a feature we measure.

use serde::Serialize;

/// Highway values counted as roads.
pub const ROAD_TAGS: &[&str] = &[
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
];

/// Highway values counted as trails.
pub const TRAIL_TAGS: &[&str] = &[
    "pedestrian",
    "track",
    "path",
    "footway",
    "bridleway",
    "steps",
    "via_ferrata",
    "cycleway",
];

/// Category a way's segments are accumulated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    Road,
    Trail,
}

impl RoadClass {
    /// Classifies a `highway` tag value, `None` if it is not recognized.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if ROAD_TAGS.contains(&tag) {
            Some(Self::Road)
        } else if TRAIL_TAGS.contains(&tag) {
            Some(Self::Trail)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Road => write!(f, "road"),
            Self::Trail => write!(f, "trail"),
        }
    }
}

/// Anchored alternation over every recognized tag, e.g. `^(motorway|...)$`.
pub fn tag_pattern() -> String {
    let all: Vec<&str> = ROAD_TAGS.iter().chain(TRAIL_TAGS).copied().collect();
    format!("^({})$", all.join("|"))
}
