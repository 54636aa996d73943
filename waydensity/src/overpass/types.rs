//! Provider errors and raw line features.

use std::time::Duration;

use geo::Coord;
use thiserror::Error;

/// Errors from a single request to the line-data service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport failure or non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// No response within the per-request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A way returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct WayElement {
    /// OSM way id
    pub id: i64,
    /// Value of the `highway` tag, if any
    pub highway: Option<String>,
    /// Ordered points in `(x = lon, y = lat)`
    pub points: Vec<Coord<f64>>,
}
