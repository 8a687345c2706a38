//! Multi-provider lookups.
//!
//! Every selected provider is looked up concurrently. A failing provider
//! never aborts the others: its error is kept next to the other providers'
//! releases in the [`ProviderReleaseMap`].

use std::sync::Arc;

use url::Url;

use crate::cache::SnapshotStore;
use crate::config::Config;
use crate::error::{LookupError, Result};
use crate::model::Release;
use crate::providers::{AnyProvider, tidal};
use crate::scheduler::{HttpTransport, QueryScheduler};

use super::request::validate_region;
use super::{LookupRequest, lookup_release};

/// One provider taking part in a combined lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub internal_name: String,
    /// Release ID or URL; `None` looks the provider up by GTIN
    pub id: Option<String>,
    pub is_template: bool,
}

impl ProviderSelection {
    pub fn by_gtin(internal_name: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
            id: None,
            is_template: false,
        }
    }

    pub fn by_id(internal_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
            id: Some(id.into()),
            is_template: false,
        }
    }
}

/// Lookup across several providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedRequest {
    pub gtin: Option<String>,
    /// Providers in preference order
    pub providers: Vec<ProviderSelection>,
    pub regions: Vec<String>,
    pub snapshot_max_timestamp: Option<i64>,
}

/// Per-provider lookup results in preference order.
#[derive(Debug, Default)]
pub struct ProviderReleaseMap {
    entries: Vec<(String, Result<Release>)>,
}

impl ProviderReleaseMap {
    pub fn insert(&mut self, provider: impl Into<String>, result: Result<Release>) {
        self.entries.push((provider.into(), result));
    }

    pub fn get(&self, provider: &str) -> Option<&Result<Release>> {
        self.entries
            .iter()
            .find(|(name, _)| name == provider)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<Release>)> {
        self.entries.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// Successful lookups.
    pub fn releases(&self) -> impl Iterator<Item = (&str, &Release)> {
        self.iter()
            .filter_map(|(name, result)| result.as_ref().ok().map(|release| (name, release)))
    }

    /// Failed lookups.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &LookupError)> {
        self.iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|error| (name, error)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All providers with their schedulers.
pub struct LookupEngine {
    providers: Vec<(AnyProvider, QueryScheduler)>,
    strict_replay: bool,
    allow_mixed_freshness: bool,
}

impl LookupEngine {
    /// Create one scheduler per supported provider.
    pub fn new(
        config: &Config,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let providers = AnyProvider::INTERNAL_NAMES
            .iter()
            .filter_map(|name| AnyProvider::from_internal_name(name))
            .map(|provider| {
                let mut scheduler = QueryScheduler::new(
                    provider.name(),
                    transport.clone(),
                    store.clone(),
                    config.scheduler.max_concurrent_requests,
                );
                if let AnyProvider::Tidal(_) = provider {
                    let token = config.credentials.tidal_access_token.as_deref();
                    for (name, value) in tidal::api_headers(token) {
                        scheduler = scheduler.with_header(name, value);
                    }
                }
                (provider, scheduler)
            })
            .collect();

        Self {
            providers,
            strict_replay: config.lookup.strict_replay,
            allow_mixed_freshness: config.lookup.allow_mixed_freshness,
        }
    }

    pub fn provider(&self, internal_name: &str) -> Option<&AnyProvider> {
        self.find(internal_name).map(|(provider, _)| provider)
    }

    /// Internal names of all supported providers.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|(p, _)| p.internal_name()).collect()
    }

    fn find(&self, internal_name: &str) -> Option<&(AnyProvider, QueryScheduler)> {
        self.providers
            .iter()
            .find(|(provider, _)| provider.internal_name().eq_ignore_ascii_case(internal_name))
    }

    /// Find the provider a release URL belongs to.
    pub fn selection_for_url(&self, url: &Url) -> Option<(ProviderSelection, Option<String>)> {
        self.providers.iter().find_map(|(provider, _)| {
            let id = provider.extract_id(url)?;
            Some((ProviderSelection::by_id(provider.internal_name(), id.id), id.region))
        })
    }

    /// Look up the release with every selected provider concurrently.
    pub async fn lookup(&self, request: &CombinedRequest) -> ProviderReleaseMap {
        let lookups = request
            .providers
            .iter()
            .map(|selection| self.lookup_one(request, selection));
        let results = futures::future::join_all(lookups).await;

        let mut map = ProviderReleaseMap::default();
        for (selection, result) in request.providers.iter().zip(results) {
            if let Err(e) = &result {
                tracing::warn!(provider = %selection.internal_name, "Lookup failed: {}", e);
            }
            map.insert(selection.internal_name.clone(), result);
        }
        map
    }

    async fn lookup_one(
        &self,
        combined: &CombinedRequest,
        selection: &ProviderSelection,
    ) -> Result<Release> {
        let (provider, scheduler) = self.find(&selection.internal_name).ok_or_else(|| {
            LookupError::invalid_input(format!("Unknown provider '{}'", selection.internal_name))
        })?;

        let mut request = LookupRequest {
            gtin: combined.gtin.clone(),
            id: None,
            regions: combined
                .regions
                .iter()
                .map(|region| validate_region(region))
                .collect::<Result<Vec<_>>>()?,
            snapshot_max_timestamp: combined.snapshot_max_timestamp,
            strict_replay: self.strict_replay,
            allow_mixed_freshness: self.allow_mixed_freshness,
            is_template: selection.is_template,
        };

        if let Some(id) = selection.id.as_deref().filter(|id| !id.is_empty()) {
            match Url::parse(id) {
                Ok(url) if url.scheme().starts_with("http") => {
                    let entity = provider.extract_id(&url).ok_or_else(|| {
                        LookupError::invalid_input(format!(
                            "{} is not a {} release URL",
                            id,
                            provider.name()
                        ))
                    })?;
                    if let Some(region) = entity.region {
                        request.regions.retain(|r| !r.eq_ignore_ascii_case(&region));
                        request.regions.insert(0, region);
                    }
                    request.id = Some(entity.id);
                }
                _ => request.id = Some(id.to_string()),
            }
        }

        match provider {
            AnyProvider::Itunes(p) => lookup_release(p, scheduler, &request).await,
            AnyProvider::Tidal(p) => lookup_release(p, scheduler, &request).await,
        }
    }
}
