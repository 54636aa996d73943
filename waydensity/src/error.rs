//! Request-level error type.

use thiserror::Error;

use crate::coord::PolygonError;
use crate::tiling::TilePlanError;

/// Why a request produced no report.
///
/// Per-unit fetch failures never show up here; they are absorbed by the
/// fetch layer and only reflected in the counters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// The caller's polygon could not be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request was superseded or interrupted.
    #[error("request cancelled")]
    Cancelled,

    /// Planning or aggregation failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProcessError {
    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<PolygonError> for ProcessError {
    fn from(e: PolygonError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<TilePlanError> for ProcessError {
    fn from(e: TilePlanError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Result alias for request processing.
pub type ProcessResult<T> = Result<T, ProcessError>;
