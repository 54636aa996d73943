//! Serve command - run the HTTP endpoint.

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use waydensity::server::{serve, AppState};

use super::common::cancel_on_ctrl_c;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the serve command until Ctrl+C.
pub fn run(runner: &CliRunner, bind: Option<SocketAddr>) -> Result<(), CliError> {
    runner.log_startup("serve");
    let addr = bind.unwrap_or(runner.config().server.bind);
    let state = AppState::new(runner.create_processor()?);

    println!("WayDensity v{}", env!("CARGO_PKG_VERSION"));
    println!("Listening on http://{}", addr);
    println!("  POST /process-area");
    println!("  GET  /health");
    println!();
    println!("Press Ctrl+C to stop");

    runner.runtime()?.block_on(async {
        let shutdown = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(shutdown.clone());
        let result = serve(addr, state, shutdown).await;
        watcher.abort();
        result
    })?;

    println!("Server stopped.");
    Ok(())
}
