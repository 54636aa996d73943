//! Plan command - show how a polygon would be split, without fetching.

use super::common::read_polygon;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the plan command.
pub fn run(runner: &CliRunner, polygon: &str) -> Result<(), CliError> {
    let pairs = read_polygon(polygon)?;
    let summary = runner.create_processor()?.plan(&pairs)?;
    let tiling = &runner.config().tiling;

    println!("Area:       {:.3} km²", summary.area_km2);
    println!(
        "Bounds:     lat {:.5}..{:.5}, lon {:.5}..{:.5}",
        summary.bbox.min_y, summary.bbox.max_y, summary.bbox.min_x, summary.bbox.max_x
    );
    println!(
        "Mode:       {} (threshold {} km²)",
        summary.mode, tiling.area_threshold_km2
    );
    println!(
        "Units:      {} of {} candidates ({} discarded, tile size {}°)",
        summary.units, summary.candidates, summary.discarded, tiling.tile_size_deg
    );
    Ok(())
}
