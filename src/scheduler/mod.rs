//! Query scheduler and cache gateway.
//!
//! Every outbound provider request goes through a [`QueryScheduler`]:
//!
//! 1. With a snapshot ceiling, the freshest snapshot at or before the ceiling
//!    is returned. Without one, or when none exists and replay is not strict,
//!    the request is fetched live.
//! 2. Live requests wait for one of a fixed number of permits. The tokio
//!    semaphore queues waiters in FIFO order, so no request starves.
//! 3. Successful live responses are stored as new snapshots.
//!
//! One scheduler is created per provider client, so the concurrency limit
//! applies per provider.

pub mod transport;

use std::sync::Arc;

use tokio::sync::Semaphore;
use url::Url;

use crate::cache::{Snapshot, SnapshotStore};
use crate::error::{LookupError, Result};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// Default number of concurrent requests per provider.
pub const DEFAULT_MAX_CONCURRENT: usize = 20;

/// How cached snapshots may satisfy a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Only snapshots at or before this unix timestamp are used
    pub max_timestamp: Option<i64>,
    /// With a ceiling, fail with a cache miss instead of fetching live
    pub strict: bool,
}

impl SnapshotPolicy {
    /// Always fetch live data.
    pub fn live() -> Self {
        Self::default()
    }

    /// Replay snapshots up to `max_timestamp`, never fetching live.
    pub fn replay(max_timestamp: i64) -> Self {
        Self {
            max_timestamp: Some(max_timestamp),
            strict: true,
        }
    }
}

/// Result of [`QueryScheduler::query_all_regions`].
#[derive(Debug, Clone)]
pub struct RegionMatch<T> {
    /// Region that produced valid data (`None` for region-less providers)
    pub region: Option<String>,
    pub snapshot: Snapshot,
    pub data: T,
}

/// Walks the caller's region list in priority order.
#[derive(Debug, Clone)]
pub struct RegionCursor<'a> {
    regions: &'a [String],
    index: usize,
}

impl<'a> RegionCursor<'a> {
    pub fn new(regions: &'a [String]) -> Self {
        Self { regions, index: 0 }
    }

    /// The next region to try. A region-less lookup yields `Some(None)` once.
    pub fn next_region(&mut self) -> Option<Option<&'a str>> {
        let region = if self.regions.is_empty() {
            (self.index == 0).then_some(None)
        } else {
            self.regions.get(self.index).map(|r| Some(r.as_str()))
        };
        self.index += 1;
        region
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.regions.len().max(1)
    }
}

/// Bounded-concurrency request dispatcher backed by a snapshot store.
pub struct QueryScheduler {
    provider: String,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SnapshotStore>,
    permits: Arc<Semaphore>,
    headers: Vec<(String, String)>,
}

impl QueryScheduler {
    pub fn new(
        provider: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SnapshotStore>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            provider: provider.into(),
            transport,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            headers: Vec::new(),
        }
    }

    /// Send `name: value` with every live request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Number of requests that could start right now.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Fetch `url`, honoring the snapshot policy.
    pub async fn query(&self, url: &Url, policy: &SnapshotPolicy) -> Result<Snapshot> {
        if let Some(max_timestamp) = policy.max_timestamp {
            if let Some(snapshot) = self.store.latest(url, Some(max_timestamp)).await? {
                return Ok(snapshot);
            }
            if policy.strict {
                return Err(LookupError::CacheMiss {
                    url: url.to_string(),
                    max_timestamp,
                });
            }
            tracing::debug!(url = %url, max_timestamp, "No snapshot, fetching live");
        }

        self.fetch_live(url).await
    }

    async fn fetch_live(&self, url: &Url) -> Result<Snapshot> {
        let response = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| LookupError::Network("Request queue closed".to_string()))?;
            tracing::debug!(provider = %self.provider, url = %url, "Fetching");
            self.transport.get(url, &self.headers).await?
        };

        if !response.is_success() {
            return Err(LookupError::response(
                &self.provider,
                url.as_str(),
                format!("HTTP {}", response.status),
            ));
        }

        let timestamp = chrono::Utc::now().timestamp();
        if let Err(e) = self.store.store(url, timestamp, &response.body).await {
            // The response is still usable, only reproducibility suffers
            tracing::warn!(url = %url, "Failed to store snapshot: {}", e);
        }

        Ok(Snapshot {
            url: url.to_string(),
            timestamp,
            content: response.body,
            is_fresh: true,
        })
    }

    /// Try each region in order and return the first valid data.
    ///
    /// `build_url` creates the request for a region, `parse` decodes the
    /// response (a decoding failure aborts the search) and `is_valid` decides
    /// whether the region has the data.
    pub async fn query_all_regions<T, B, P, V>(
        &self,
        regions: &[String],
        policy: &SnapshotPolicy,
        build_url: B,
        parse: P,
        is_valid: V,
    ) -> Result<RegionMatch<T>>
    where
        B: Fn(Option<&str>) -> Result<Url>,
        P: Fn(&Snapshot) -> Result<T>,
        V: Fn(&T) -> bool,
    {
        let mut cursor = RegionCursor::new(regions);
        while let Some(region) = cursor.next_region() {
            let url = build_url(region)?;
            tracing::debug!(provider = %self.provider, region = ?region, "Trying region");
            let snapshot = self.query(&url, policy).await?;
            let data = parse(&snapshot)?;
            if is_valid(&data) {
                return Ok(RegionMatch {
                    region: region.map(String::from),
                    snapshot,
                    data,
                });
            }
        }

        Err(LookupError::not_found(
            &self.provider,
            if regions.is_empty() {
                "No release found".to_string()
            } else {
                format!("No release found in regions {}", regions.join(", "))
            },
        ))
    }
}
