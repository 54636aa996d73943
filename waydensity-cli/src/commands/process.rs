//! Process command - measure roads and trails inside a polygon.

use tokio_util::sync::CancellationToken;

use super::common::{cancel_on_ctrl_c, read_polygon};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the process command.
pub struct ProcessArgs {
    pub polygon: String,
    pub pretty: bool,
}

/// Run the process command.
pub fn run(runner: &CliRunner, args: ProcessArgs) -> Result<(), CliError> {
    runner.log_startup("process");
    let pairs = read_polygon(&args.polygon)?;
    let processor = runner.create_processor()?;

    let outcome = runner.runtime()?.block_on(async {
        let cancel = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(cancel.clone());
        let result = processor.process(&pairs, &cancel).await;
        watcher.abort();
        result
    })?;

    let stats = &outcome.stats;
    if stats.failed > 0 {
        eprintln!(
            "Warning: {} of {} {} units failed after retries; totals are partial",
            stats.failed, stats.units, outcome.mode
        );
    }
    if outcome.report.geometry_omitted {
        eprintln!(
            "Note: segment geometry omitted ({:.1} km exceeds the {:.0} km limit)",
            outcome.report.total_km,
            runner.config().max_geometry_km
        );
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&outcome.report)?
    } else {
        serde_json::to_string(&outcome.report)?
    };
    println!("{}", json);
    Ok(())
}
