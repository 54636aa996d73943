//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::types::ProviderError;

/// Connection establishment timeout.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP POST with a `text/plain` body.
    ///
    /// # Returns
    ///
    /// The response body as bytes, or an error for transport failures and
    /// non-success status codes.
    fn post_text(
        &self,
        url: &str,
        body: String,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with a crate user agent.
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("waydensity/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn post_text(&self, url: &str, body: String) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock HTTP client that replays a fixed sequence of responses.
    ///
    /// The last response repeats once the sequence is exhausted.
    pub struct MockAsyncHttpClient {
        responses: Mutex<Vec<Result<Vec<u8>, ProviderError>>>,
        latency: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl MockAsyncHttpClient {
        pub fn new(responses: Vec<Result<Vec<u8>, ProviderError>>) -> Self {
            assert!(!responses.is_empty(), "mock needs at least one response");
            Self {
                responses: Mutex::new(responses),
                latency: None,
                calls: AtomicUsize::new(0),
            }
        }

        /// Delays every response by `latency`.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        pub fn always(response: Result<Vec<u8>, ProviderError>) -> Self {
            Self::new(vec![response])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn post_text(&self, _url: &str, _body: String) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            }
        }
    }

    #[tokio::test]
    async fn test_mock_client_sequence() {
        let mock = MockAsyncHttpClient::new(vec![
            Err(ProviderError::HttpError("Test error".to_string())),
            Ok(vec![1, 2, 3, 4]),
        ]);

        assert!(mock.post_text("http://example.com", String::new()).await.is_err());
        assert_eq!(
            mock.post_text("http://example.com", String::new()).await.unwrap(),
            vec![1, 2, 3, 4]
        );
        // Last response repeats
        assert!(mock.post_text("http://example.com", String::new()).await.is_ok());
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new().is_ok());
    }
}
