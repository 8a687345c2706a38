//! Per-lookup execution context.
//!
//! A [`LookupContext`] lives for exactly one provider lookup. It routes every
//! request through the provider's [`QueryScheduler`], remembers the newest
//! snapshot the lookup depended on, and collects the provider's messages.

use serde::de::DeserializeOwned;
use url::Url;

use crate::cache::Snapshot;
use crate::error::{LookupError, Result};
use crate::model::{MessageSeverity, ProviderMessage};
use crate::scheduler::{QueryScheduler, RegionMatch, SnapshotPolicy};

use super::request::LookupRequest;
use super::state::LookupState;

pub struct LookupContext<'a> {
    provider: &'a str,
    scheduler: &'a QueryScheduler,
    request: &'a LookupRequest,
    state: LookupState,
    history: Vec<LookupState>,
    messages: Vec<ProviderMessage>,
    region: Option<String>,
    cache_time: Option<i64>,
    used_cache: bool,
    used_live: bool,
}

impl<'a> LookupContext<'a> {
    pub fn new(provider: &'a str, scheduler: &'a QueryScheduler, request: &'a LookupRequest) -> Self {
        Self {
            provider,
            scheduler,
            request,
            state: LookupState::Constructing,
            history: vec![LookupState::Constructing],
            messages: Vec::new(),
            region: None,
            cache_time: None,
            used_cache: false,
            used_live: false,
        }
    }

    /// Display name of the provider.
    pub fn provider(&self) -> &str {
        self.provider
    }

    pub fn request(&self) -> &'a LookupRequest {
        self.request
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.request.snapshot_policy()
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[LookupState] {
        &self.history
    }

    pub fn transition(&mut self, state: LookupState) {
        tracing::trace!(provider = %self.provider, from = %self.state, to = %state, "Lookup state");
        self.history.push(state.clone());
        self.state = state;
    }

    /// Region the release was found in.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Timestamp of the newest snapshot this lookup used.
    pub fn cache_time(&self) -> Option<i64> {
        self.cache_time
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(MessageSeverity::Warning, text);
    }

    pub fn debug(&mut self, text: impl Into<String>) {
        self.push(MessageSeverity::Debug, text);
    }

    fn push(&mut self, severity: MessageSeverity, text: impl Into<String>) {
        self.messages.push(ProviderMessage {
            severity,
            text: text.into(),
            provider: Some(self.provider.to_string()),
        });
    }

    /// Warn about further releases that matched the lookup.
    pub fn warn_additional_matches(&mut self, urls: &[String]) {
        if !urls.is_empty() {
            self.warn(format!("Additional matches: {}", urls.join(", ")));
        }
    }

    pub fn take_messages(&mut self) -> Vec<ProviderMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Fetch one response through the scheduler.
    pub async fn query(&mut self, url: &Url) -> Result<Snapshot> {
        let snapshot = self.scheduler.query(url, &self.policy()).await?;
        self.record(&snapshot)?;
        Ok(snapshot)
    }

    /// Fetch a JSON response and decode it.
    pub async fn query_json<T: DeserializeOwned>(&mut self, url: &Url) -> Result<T> {
        let snapshot = self.query(url).await?;
        decode_json(self.provider, &snapshot)
    }

    /// Try each requested region in order until `is_valid` accepts the decoded response.
    pub async fn query_all_regions<T, B, V>(&mut self, build_url: B, is_valid: V) -> Result<T>
    where
        T: DeserializeOwned,
        B: Fn(Option<&str>) -> Result<Url>,
        V: Fn(&T) -> bool,
    {
        let provider = self.provider;
        let RegionMatch {
            region,
            snapshot,
            data,
        } = self
            .scheduler
            .query_all_regions(
                &self.request.regions,
                &self.policy(),
                build_url,
                |snapshot| decode_json(provider, snapshot),
                is_valid,
            )
            .await?;

        self.transition(LookupState::Fetching {
            region: region.clone(),
        });
        self.region = region;
        self.record(&snapshot)?;
        Ok(data)
    }

    /// Track the snapshot's age. Under a ceiling, mixing replayed and live
    /// pages fails unless the request allows it.
    fn record(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.is_fresh {
            self.used_live = true;
        } else {
            self.used_cache = true;
        }
        self.cache_time = Some(
            self.cache_time
                .map_or(snapshot.timestamp, |t| t.max(snapshot.timestamp)),
        );

        if let Some(max_timestamp) = self.request.snapshot_max_timestamp {
            if self.used_cache && self.used_live && !self.request.allow_mixed_freshness {
                return Err(LookupError::CacheMiss {
                    url: snapshot.url.clone(),
                    max_timestamp,
                });
            }
        }
        Ok(())
    }
}

fn decode_json<T: DeserializeOwned>(provider: &str, snapshot: &Snapshot) -> Result<T> {
    serde_json::from_slice(&snapshot.content)
        .map_err(|e| LookupError::response(provider, snapshot.url.as_str(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemorySnapshotStore, SnapshotStore};
    use crate::scheduler::transport::mocks::MockTransport;
    use std::sync::Arc;

    fn url(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    #[tokio::test]
    async fn test_records_newest_cache_time() {
        let transport = Arc::new(MockTransport::new());
        let store = Arc::new(MemorySnapshotStore::default());
        store.store(&url("https://api.example.com/1"), 100, b"{}").await.unwrap();
        store.store(&url("https://api.example.com/2"), 150, b"{}").await.unwrap();
        let scheduler = QueryScheduler::new("Test", transport, store, 4);
        let request = LookupRequest {
            snapshot_max_timestamp: Some(200),
            strict_replay: true,
            ..LookupRequest::by_id("1")
        };
        let mut ctx = LookupContext::new("Test", &scheduler, &request);

        ctx.query(&url("https://api.example.com/2")).await.unwrap();
        ctx.query(&url("https://api.example.com/1")).await.unwrap();

        assert_eq!(ctx.cache_time(), Some(150));
    }

    #[tokio::test]
    async fn test_mixed_freshness_is_a_cache_miss() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("https://api.example.com/2", "{}");
        let store = Arc::new(MemorySnapshotStore::default());
        store.store(&url("https://api.example.com/1"), 100, b"{}").await.unwrap();
        let scheduler = QueryScheduler::new("Test", transport, store, 4);
        let request = LookupRequest {
            snapshot_max_timestamp: Some(200),
            strict_replay: false,
            ..LookupRequest::by_id("1")
        };
        let mut ctx = LookupContext::new("Test", &scheduler, &request);

        ctx.query(&url("https://api.example.com/1")).await.unwrap();
        let result = ctx.query(&url("https://api.example.com/2")).await;

        assert!(matches!(result, Err(LookupError::CacheMiss { max_timestamp: 200, .. })));
    }

    #[tokio::test]
    async fn test_mixed_freshness_can_be_allowed() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("https://api.example.com/2", "{}");
        let store = Arc::new(MemorySnapshotStore::default());
        store.store(&url("https://api.example.com/1"), 100, b"{}").await.unwrap();
        let scheduler = QueryScheduler::new("Test", transport, store, 4);
        let request = LookupRequest {
            snapshot_max_timestamp: Some(200),
            strict_replay: false,
            allow_mixed_freshness: true,
            ..LookupRequest::by_id("1")
        };
        let mut ctx = LookupContext::new("Test", &scheduler, &request);

        ctx.query(&url("https://api.example.com/1")).await.unwrap();
        ctx.query(&url("https://api.example.com/2")).await.unwrap();

        assert!(ctx.cache_time().unwrap() > 100);
    }

    #[tokio::test]
    async fn test_invalid_json_is_response_error() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("https://api.example.com/bad", "<html>");
        let scheduler =
            QueryScheduler::new("Test", transport, Arc::new(MemorySnapshotStore::default()), 4);
        let request = LookupRequest::by_id("1");
        let mut ctx = LookupContext::new("Test", &scheduler, &request);

        let result: Result<serde_json::Value> =
            ctx.query_json(&url("https://api.example.com/bad")).await;

        assert!(matches!(result, Err(LookupError::Response { .. })));
    }

    #[test]
    fn test_additional_matches_message() {
        let transport = Arc::new(MockTransport::new());
        let scheduler =
            QueryScheduler::new("Test", transport, Arc::new(MemorySnapshotStore::default()), 4);
        let request = LookupRequest::by_id("1");
        let mut ctx = LookupContext::new("Test", &scheduler, &request);

        ctx.warn_additional_matches(&[]);
        ctx.warn_additional_matches(&["https://a".to_string(), "https://b".to_string()]);

        let messages = ctx.take_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Additional matches: https://a, https://b");
        assert_eq!(messages[0].severity, MessageSeverity::Warning);
    }
}
