//! iTunes Search API provider.
//!
//! Looks up albums by UPC or collection ID. Store availability differs per
//! country, so every lookup walks the configured regions until one returns
//! a collection.

pub mod adapter;
pub mod dto;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{LookupError, Result};
use crate::lookup::LookupContext;
use crate::model::{EntityId, LookupMethod, Release};
use crate::providers::{ProviderFeatures, ReleaseProvider};

const API_BASE: &str = "https://itunes.apple.com/lookup";

/// Maximum number of songs returned per lookup.
const RESULT_LIMIT: &str = "200";

static ALBUM_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?:([a-z]{2})/)?album/(?:[^/]+/)?(?:id)?(\d+)/?$").expect("valid album path regex")
});

/// Raw data of one iTunes lookup.
#[derive(Debug, Clone)]
pub struct ItunesRelease {
    pub response: dto::LookupResponse,
    /// GTIN the lookup was made with; the API does not report barcodes
    pub gtin: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ItunesProvider;

#[async_trait]
impl ReleaseProvider for ItunesProvider {
    type Raw = ItunesRelease;

    fn name(&self) -> &'static str {
        "iTunes"
    }

    fn internal_name(&self) -> &'static str {
        "itunes"
    }

    fn features(&self) -> ProviderFeatures {
        ProviderFeatures {
            gtin_lookup: true,
            regions: true,
            max_image_size: Some(adapter::FULL_ARTWORK_SIZE),
        }
    }

    fn construct_api_url(
        &self,
        method: Option<LookupMethod>,
        value: &str,
        region: Option<&str>,
    ) -> Result<Url> {
        let method = method.ok_or_else(|| self.unsupported("Lookup without GTIN or ID"))?;
        let mut url =
            Url::parse(API_BASE).map_err(|e| LookupError::provider(self.name(), e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            match method {
                LookupMethod::Gtin => query.append_pair("upc", value),
                LookupMethod::Id => query.append_pair("id", value),
            };
            query.append_pair("entity", "song");
            if let Some(region) = region {
                query.append_pair("country", &region.to_ascii_lowercase());
            }
            query.append_pair("limit", RESULT_LIMIT);
        }
        Ok(url)
    }

    fn extract_id(&self, url: &Url) -> Option<EntityId> {
        match url.host_str()? {
            "music.apple.com" | "itunes.apple.com" | "geo.music.apple.com" => {}
            _ => return None,
        }
        let captures = ALBUM_PATH.captures(url.path())?;
        let mut id = EntityId::new(self.internal_name(), "album", captures.get(2)?.as_str());
        id.region = captures.get(1).map(|m| m.as_str().to_ascii_uppercase());
        Some(id)
    }

    fn release_url(&self, id: &str, region: Option<&str>) -> String {
        match region {
            Some(region) => format!(
                "https://music.apple.com/{}/album/{}",
                region.to_ascii_lowercase(),
                id
            ),
            None => format!("https://music.apple.com/album/{}", id),
        }
    }

    async fn fetch_raw(
        &self,
        method: LookupMethod,
        value: &str,
        ctx: &mut LookupContext<'_>,
    ) -> Result<Self::Raw> {
        let response: dto::LookupResponse = ctx
            .query_all_regions(
                |region| self.construct_api_url(Some(method), value, region),
                |response: &dto::LookupResponse| {
                    response.result_count > 0 && response.collections().next().is_some()
                },
            )
            .await?;

        Ok(ItunesRelease {
            response,
            gtin: (method == LookupMethod::Gtin).then(|| value.to_string()),
        })
    }

    fn raw_id(&self, raw: &Self::Raw) -> String {
        raw.response
            .collections()
            .next()
            .map(|collection| collection.collection_id.to_string())
            .unwrap_or_default()
    }

    fn convert(&self, raw: Self::Raw, ctx: &mut LookupContext<'_>) -> Result<Release> {
        let (release, additional) = adapter::to_release(&raw.response, raw.gtin.as_deref())?;
        ctx.warn_additional_matches(&additional);
        Ok(release)
    }
}
