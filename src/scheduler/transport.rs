//! HTTP transport seam.
//!
//! Production code uses [`ReqwestTransport`]; tests substitute the mock in
//! [`mocks`]. Transports never retry: a failed request is reported to the
//! caller, who decides whether to try again.

use async_trait::async_trait;
use url::Url;

use crate::error::{LookupError, Result};

/// User agent sent to every provider.
pub const USER_AGENT: &str = concat!(
    "ReleaseHarmonizer/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/release-harmonizer)"
);

/// Raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs GET requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url`. Only transport failures are errors; any HTTP status is a response.
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse>;
}

/// Transport backed by `reqwest`.
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a new transport with the default user agent
    pub fn new() -> Result<Self> {
        Self::with_user_agent(USER_AGENT)
    }

    /// Create a new transport
    ///
    /// The client is configured to:
    /// - Accept gzip-compressed responses
    /// - Send a User-Agent header identifying the application
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LookupError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut request = self.http_client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Mock transport for testing.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned bodies keyed by full URL and records every request.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, HttpResponse>>,
        /// URLs requested, in order
        pub requests: Mutex<Vec<String>>,
        /// Artificial latency per request
        pub delay: Option<Duration>,
        in_flight: AtomicUsize,
        /// Highest number of concurrent requests observed
        pub max_in_flight: AtomicUsize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        /// Serve `body` with status 200 for `url`.
        pub fn respond(&self, url: &str, body: impl Into<Vec<u8>>) {
            self.respond_with(url, 200, body);
        }

        pub fn respond_with(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
            let url = Url::parse(url).expect("valid mock url").to_string();
            self.responses.lock().insert(
                url,
                HttpResponse {
                    status,
                    body: body.into(),
                },
            );
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn get(&self, url: &Url, _headers: &[(String, String)]) -> Result<HttpResponse> {
            self.requests.lock().push(url.to_string());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let response = self.responses.lock().get(url.as_str()).cloned();
            response.ok_or_else(|| LookupError::Network(format!("No mock response for {}", url)))
        }
    }
}
