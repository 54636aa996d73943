//! Overpass API line-data provider
//!
//! Builds Overpass QL queries for processing units, posts them through an
//! [`AsyncHttpClient`], and decodes the returned ways.
//!
//! # Example
//!
//! ```ignore
//! use waydensity::overpass::{OverpassClient, OverpassConfig, ReqwestClient};
//!
//! let client = OverpassClient::new(ReqwestClient::new()?, OverpassConfig::default());
//! let query = client.query_for(&unit.region);
//! let fetched = client.fetch(&query, &cancel).await?;
//! ```

mod client;
mod http;
mod query;
mod response;
mod types;

pub use client::{
    FetchError, Fetched, OverpassClient, OverpassConfig, DEFAULT_ENDPOINT,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use http::{AsyncHttpClient, ReqwestClient};
pub use query::{build_way_query, poly_string, DEFAULT_QUERY_TIMEOUT_SECS};
pub use response::parse_ways;
pub use types::{ProviderError, WayElement};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
