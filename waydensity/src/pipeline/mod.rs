//! Area processing pipeline
//!
//! Ties the stages together for one request:
//!
//! ```text
//! pairs ─► Polygon ─► area + bbox ─► TilePlan ─┬─► fetch ─► clip ─┐
//!                                              ├─► fetch ─► clip ─┤  one batch
//!                                              └─► fetch ─► clip ─┘
//!                                                        │ merge sequentially
//!                                                        ▼
//!                                                   AreaReport
//! ```
//!
//! All accumulators live inside [`AreaProcessor::process`], so concurrent
//! requests never share segment state and a cancelled request leaves nothing
//! behind.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AreaReport, DEFAULT_MAX_GEOMETRY_KM};
use crate::clip::{clip_ways, ClippedSegments};
use crate::coord::Polygon;
use crate::error::{ProcessError, ProcessResult};
use crate::fetch::{run_batched, BatchConfig, FetchStats};
use crate::geometry::{self, BoundingBox};
use crate::overpass::{AsyncHttpClient, FetchError, Fetched, OverpassClient};
use crate::tiling::{self, PlanMode, ProcessingUnit, TilePlan, TilingConfig};

/// Pipeline tuning, independent of the Overpass client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub tiling: TilingConfig,
    pub batch: BatchConfig,
    /// Combined length (km) above which segment geometry is omitted.
    pub max_geometry_km: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tiling: TilingConfig::default(),
            batch: BatchConfig::default(),
            max_geometry_km: DEFAULT_MAX_GEOMETRY_KM,
        }
    }
}

/// A completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub report: AreaReport,
    pub stats: FetchStats,
    pub mode: PlanMode,
}

/// What [`AreaProcessor::process`] would do for a polygon, without fetching.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub area_km2: f64,
    pub bbox: BoundingBox,
    pub mode: PlanMode,
    /// Grid cells considered (1 in single mode).
    pub candidates: usize,
    /// Units that would be fetched.
    pub units: usize,
    /// Grid cells dropped before fetching.
    pub discarded: usize,
}

/// Ways fetched for a unit and the segments they left after clipping.
struct UnitResult {
    fetched: Fetched,
    clipped: ClippedSegments,
}

/// Runs the area pipeline against an Overpass client.
pub struct AreaProcessor<C: AsyncHttpClient> {
    client: OverpassClient<C>,
    config: PipelineConfig,
}

impl<C: AsyncHttpClient> AreaProcessor<C> {
    pub fn new(client: OverpassClient<C>, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn client(&self) -> &OverpassClient<C> {
        &self.client
    }

    /// Normalizes the input and plans its units.
    fn prepare(&self, pairs: &[Vec<f64>]) -> ProcessResult<(Polygon, BoundingBox, f64, TilePlan)> {
        let polygon = Polygon::from_lat_lon_pairs(pairs)?;
        let bbox = BoundingBox::of(&polygon);
        let area_km2 = geometry::area_km2(&polygon);
        if !area_km2.is_finite() {
            return Err(ProcessError::Internal(format!(
                "polygon area is not finite: {}",
                area_km2
            )));
        }

        let plan = tiling::plan(&polygon, &bbox, area_km2, &self.config.tiling)?;
        Ok((polygon, bbox, area_km2, plan))
    }

    /// Dry run: normalization, area and planning only.
    pub fn plan(&self, pairs: &[Vec<f64>]) -> ProcessResult<PlanSummary> {
        let (_, bbox, area_km2, plan) = self.prepare(pairs)?;
        Ok(PlanSummary {
            area_km2,
            bbox,
            mode: plan.mode,
            candidates: plan.candidates,
            units: plan.units.len(),
            discarded: plan.discarded,
        })
    }

    /// Processes one request end to end.
    ///
    /// Units that still fail after their retry budget contribute nothing and
    /// are only counted in [`FetchStats::failed`]. Aggregation starts once
    /// every unit has finished. If `cancel` fires, the request ends with
    /// [`ProcessError::Cancelled`] and partial results are dropped.
    pub async fn process(
        &self,
        pairs: &[Vec<f64>],
        cancel: &CancellationToken,
    ) -> ProcessResult<ProcessOutcome> {
        let started = Instant::now();
        let (polygon, _, area_km2, plan) = self.prepare(pairs)?;

        info!(
            area_km2,
            mode = %plan.mode,
            units = plan.units.len(),
            discarded = plan.discarded,
            "Processing area"
        );

        let mut stats = FetchStats::new(plan.units.len());
        let mut segments = ClippedSegments::default();
        let polygon = &polygon;

        run_batched(
            &plan.units,
            &self.config.batch,
            cancel,
            |unit| self.run_unit(unit, polygon, cancel),
            |unit, result| match result {
                Ok(UnitResult { fetched, clipped }) => {
                    stats.record(Ok(&fetched));
                    debug!(
                        unit = unit.index,
                        ways = fetched.ways.len(),
                        kept = clipped.len(),
                        "Unit clipped"
                    );
                    segments.merge(clipped);
                }
                Err(error) => {
                    if let FetchError::Exhausted { attempts, last } = &error {
                        warn!(
                            unit = unit.index,
                            tile = ?unit.tile,
                            attempts,
                            error = %last,
                            "Unit failed after retries, skipping"
                        );
                    }
                    stats.record(Err(&error));
                }
            },
        )
        .await
        .map_err(|_| ProcessError::Cancelled)?;

        let report = aggregate(area_km2, &segments, self.config.max_geometry_km);
        if !report.total_km.is_finite() {
            return Err(ProcessError::Internal(
                "aggregated length is not finite".to_string(),
            ));
        }

        info!(
            total_km_roads = report.total_km_roads,
            total_km_trails = report.total_km_trails,
            succeeded = stats.succeeded,
            failed = stats.failed,
            geometry_omitted = report.geometry_omitted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Area processed"
        );

        Ok(ProcessOutcome {
            report,
            stats,
            mode: plan.mode,
        })
    }

    async fn run_unit(
        &self,
        unit: &ProcessingUnit,
        polygon: &Polygon,
        cancel: &CancellationToken,
    ) -> Result<UnitResult, FetchError> {
        let query = self.client.query_for(&unit.region);
        let fetched = self.client.fetch(&query, cancel).await?;
        let clipped = clip_ways(&fetched.ways, &unit.filter, polygon);
        Ok(UnitResult { fetched, clipped })
    }
}
