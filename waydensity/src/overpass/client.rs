//! Overpass client with retry, per-attempt timeout and cancellation.

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::http::AsyncHttpClient;
use super::query::{build_way_query, DEFAULT_QUERY_TIMEOUT_SECS};
use super::response::parse_ways;
use super::types::{ProviderError, WayElement};
use crate::fetch::RetryPolicy;
use crate::tiling::QueryRegion;

/// Public Overpass interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default client-side timeout for one attempt.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Why a unit's fetch produced no ways.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The owning request was cancelled.
    #[error("fetch cancelled")]
    Cancelled,

    /// Every attempt in the retry budget failed.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: ProviderError },
}

/// Ways returned by a successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub ways: Vec<WayElement>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassConfig {
    /// Interpreter URL.
    pub endpoint: String,
    /// Client-side timeout per attempt.
    pub request_timeout: Duration,
    /// Server-side `[timeout:N]` in seconds.
    pub query_timeout_secs: u64,
    /// Retry budget and backoff.
    pub retry: RetryPolicy,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches ways for processing units.
pub struct OverpassClient<C: AsyncHttpClient> {
    http: C,
    config: OverpassConfig,
}

impl<C: AsyncHttpClient> OverpassClient<C> {
    pub fn new(http: C, config: OverpassConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    /// Query text for a unit's region.
    pub fn query_for(&self, region: &QueryRegion) -> String {
        build_way_query(&region.vertices(), self.config.query_timeout_secs)
    }

    /// Runs a query, retrying with backoff until it succeeds, the budget is
    /// spent, or `cancel` fires.
    ///
    /// The token is checked before every attempt and raced against both the
    /// request and the backoff sleep.
    pub async fn fetch(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let request = tokio::time::timeout(
                self.config.request_timeout,
                self.http.post_text(&self.config.endpoint, query.to_string()),
            );
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                outcome = request => outcome,
            };

            let error = match outcome {
                Ok(Ok(body)) => match parse_ways(&body) {
                    Ok(ways) => return Ok(Fetched { ways, attempts: attempt }),
                    Err(e) => e,
                },
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.config.request_timeout),
            };

            let Some(delay) = self.config.retry.delay_for_attempt(attempt) else {
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            };

            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Overpass request failed, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::http::tests::MockAsyncHttpClient;

    const ONE_WAY: &[u8] = br#"{"elements": [
        {"type": "way", "id": 7, "tags": {"highway": "track"},
         "geometry": [{"lat": 1.0, "lon": 1.0}, {"lat": 1.1, "lon": 1.1}]}
    ]}"#;

    fn fast_config(max_attempts: u32) -> OverpassConfig {
        OverpassConfig {
            retry: RetryPolicy::exponential(max_attempts)
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(4)),
            ..OverpassConfig::default()
        }
    }

    fn http_error() -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::HttpError("HTTP 429".to_string()))
    }

    #[tokio::test]
    async fn test_fetch_success_first_try() {
        let mock = MockAsyncHttpClient::always(Ok(ONE_WAY.to_vec()));
        let client = OverpassClient::new(mock, fast_config(3));
        let fetched = client.fetch("q", &CancellationToken::new()).await.unwrap();

        assert_eq!(fetched.attempts, 1);
        assert_eq!(fetched.ways.len(), 1);
        assert_eq!(fetched.ways[0].id, 7);
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_failures() {
        let mock = MockAsyncHttpClient::new(vec![http_error(), http_error(), Ok(ONE_WAY.to_vec())]);
        let client = OverpassClient::new(mock, fast_config(3));
        let fetched = client.fetch("q", &CancellationToken::new()).await.unwrap();

        assert_eq!(fetched.attempts, 3);
        assert_eq!(client.http.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_exhausts_budget() {
        let mock = MockAsyncHttpClient::always(http_error());
        let client = OverpassClient::new(mock, fast_config(3));
        let err = client.fetch("q", &CancellationToken::new()).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Exhausted {
                attempts: 3,
                last: ProviderError::HttpError("HTTP 429".to_string()),
            }
        );
        assert_eq!(client.http.call_count(), 3);
    }

    #[tokio::test]
    async fn test_invalid_body_is_retried() {
        let mock = MockAsyncHttpClient::new(vec![Ok(b"not json".to_vec()), Ok(ONE_WAY.to_vec())]);
        let client = OverpassClient::new(mock, fast_config(2));
        let fetched = client.fetch("q", &CancellationToken::new()).await.unwrap();
        assert_eq!(fetched.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_responses_time_out_each_attempt() {
        let mock = MockAsyncHttpClient::always(Ok(ONE_WAY.to_vec()))
            .with_latency(Duration::from_secs(120));
        let config = OverpassConfig {
            request_timeout: Duration::from_secs(30),
            ..fast_config(3)
        };
        let client = OverpassClient::new(mock, config);
        let err = client.fetch("q", &CancellationToken::new()).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Exhausted {
                attempts: 3,
                last: ProviderError::Timeout(Duration::from_secs(30)),
            }
        );
        assert_eq!(client.http.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mock = MockAsyncHttpClient::always(Ok(ONE_WAY.to_vec()));
        let client = OverpassClient::new(mock, fast_config(3));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(client.fetch("q", &cancel).await.unwrap_err(), FetchError::Cancelled);
        assert_eq!(client.http.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let config = OverpassConfig {
            retry: RetryPolicy::exponential(3).with_initial_delay(Duration::from_secs(60)),
            ..OverpassConfig::default()
        };
        let client = OverpassClient::new(MockAsyncHttpClient::always(http_error()), config);
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            }
        };
        let (result, _) = tokio::join!(client.fetch("q", &cancel), canceller);

        assert_eq!(result.unwrap_err(), FetchError::Cancelled);
        assert_eq!(client.http.call_count(), 1);
    }

    #[test]
    fn test_query_for_tile_region() {
        let mock = MockAsyncHttpClient::always(Ok(vec![]));
        let client = OverpassClient::new(mock, OverpassConfig::default());
        let region = QueryRegion::Tile(crate::geometry::BoundingBox::new(7.0, 45.0, 7.5, 45.5));
        let query = client.query_for(&region);

        assert!(query.contains("(poly:\"45 7 45 7.5 45.5 7.5 45.5 7\")"));
        assert!(query.contains("[timeout:25]"));
    }
}
