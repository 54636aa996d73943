//! WayDensity - road and trail density for map regions
//!
//! Given a polygon drawn on a map, this library fetches the OpenStreetMap
//! highway ways inside it from the Overpass API and reports total length and
//! density (km per km²) for roads and for trails.
//!
//! The entry point is [`pipeline::AreaProcessor`]:
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use waydensity::overpass::{OverpassClient, OverpassConfig, ReqwestClient};
//! use waydensity::pipeline::{AreaProcessor, PipelineConfig};
//!
//! let client = OverpassClient::new(ReqwestClient::new()?, OverpassConfig::default());
//! let processor = AreaProcessor::new(client, PipelineConfig::default());
//!
//! let polygon = vec![vec![45.0, 7.0], vec![45.0, 7.06], vec![45.04, 7.0]];
//! let outcome = processor.process(&polygon, &CancellationToken::new()).await?;
//! println!("{} km of road", outcome.report.total_km_roads);
//! ```

pub mod aggregate;
pub mod clip;
pub mod config;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod highway;
pub mod logging;
pub mod overpass;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod supervisor;
pub mod tiling;

pub use aggregate::AreaReport;
pub use error::ProcessError;
pub use pipeline::{AreaProcessor, PipelineConfig, ProcessOutcome};
