//! Tidal API v2 provider.
//!
//! Albums are requested together with their artists, items, item artists,
//! cover art and content providers. Long tracklists are split into pages;
//! each page's side table is merged into one map before any item is
//! resolved, because an item may reference an artist delivered on another
//! page.

pub mod adapter;
pub mod dto;

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{LookupError, Result};
use crate::lookup::{LookupContext, LookupState, PageCursor};
use crate::model::{EntityId, LookupMethod, Release};
use crate::providers::{ProviderFeatures, ReleaseProvider};

const API_BASE: &str = "https://openapi.tidal.com/v2";

/// Related resources requested with every album.
const INCLUDE: &str = "artists,items,items.artists,coverArt,providers";

static ALBUM_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?:browse/)?album/(\d+)(?:/u)?/?$").expect("valid album path regex")
});

/// Headers for authenticated API access.
pub fn api_headers(access_token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![("Accept".to_string(), "application/vnd.api+json".to_string())];
    if let Some(token) = access_token {
        headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    }
    headers
}

/// Album with all item pages and side tables merged.
#[derive(Debug, Clone)]
pub struct TidalRelease {
    pub album: dto::Resource,
    /// Items of all pages, in page order
    pub items: Vec<dto::ResourceIdentifier>,
    /// Side table keyed by (type, id)
    pub included: HashMap<(String, String), dto::Resource>,
}

impl TidalRelease {
    fn new(album: dto::Resource) -> Self {
        let items = album.related("items");
        Self {
            album,
            items,
            included: HashMap::new(),
        }
    }

    fn merge_included(&mut self, resources: Vec<dto::Resource>) {
        for resource in resources {
            self.included
                .insert((resource.kind.clone(), resource.id.clone()), resource);
        }
    }

    /// Resolve a reference against the side table.
    pub fn lookup(&self, identifier: &dto::ResourceIdentifier) -> Result<&dto::Resource> {
        self.included
            .get(&(identifier.kind.clone(), identifier.id.clone()))
            .ok_or_else(|| {
                LookupError::provider(
                    "Tidal",
                    format!(
                        "Missing {} resource '{}' in included data",
                        identifier.kind, identifier.id
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TidalProvider;

impl TidalProvider {
    /// Turn a pagination link into an absolute URL.
    fn resolve_link(&self, link: &str) -> Result<Url> {
        let absolute = if link.starts_with('/') {
            format!("{}{}", API_BASE, link)
        } else {
            link.to_string()
        };
        Url::parse(&absolute).map_err(|e| {
            LookupError::response(self.name(), link, format!("Invalid next link: {}", e))
        })
    }
}

#[async_trait]
impl ReleaseProvider for TidalProvider {
    type Raw = TidalRelease;

    fn name(&self) -> &'static str {
        "Tidal"
    }

    fn internal_name(&self) -> &'static str {
        "tidal"
    }

    fn features(&self) -> ProviderFeatures {
        ProviderFeatures {
            gtin_lookup: true,
            regions: true,
            max_image_size: Some(1280),
        }
    }

    fn construct_api_url(
        &self,
        method: Option<LookupMethod>,
        value: &str,
        region: Option<&str>,
    ) -> Result<Url> {
        let method = method.ok_or_else(|| self.unsupported("Lookup without GTIN or ID"))?;
        let path = match method {
            LookupMethod::Gtin => format!("{}/albums", API_BASE),
            LookupMethod::Id => format!("{}/albums/{}", API_BASE, urlencoding::encode(value)),
        };
        let mut url = Url::parse(&path).map_err(|e| LookupError::provider(self.name(), e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(region) = region {
                query.append_pair("countryCode", &region.to_ascii_uppercase());
            }
            if method == LookupMethod::Gtin {
                query.append_pair("filter[barcodeId]", value);
            }
            query.append_pair("include", INCLUDE);
        }
        Ok(url)
    }

    fn extract_id(&self, url: &Url) -> Option<EntityId> {
        match url.host_str()? {
            "tidal.com" | "www.tidal.com" | "listen.tidal.com" => {}
            _ => return None,
        }
        let captures = ALBUM_PATH.captures(url.path())?;
        Some(EntityId::new(self.internal_name(), "album", captures.get(1)?.as_str()))
    }

    fn release_url(&self, id: &str, _region: Option<&str>) -> String {
        adapter::album_url(id)
    }

    async fn fetch_raw(
        &self,
        method: LookupMethod,
        value: &str,
        ctx: &mut LookupContext<'_>,
    ) -> Result<Self::Raw> {
        let first: dto::AlbumDocument = ctx
            .query_all_regions(
                |region| self.construct_api_url(Some(method), value, region),
                |document: &dto::AlbumDocument| !document.data.is_empty(),
            )
            .await?;

        let mut albums = first.data.into_vec().into_iter();
        let album = albums
            .next()
            .ok_or_else(|| LookupError::not_found(self.name(), "No album in response"))?;
        let additional: Vec<String> = albums.map(|other| adapter::album_url(&other.id)).collect();
        ctx.warn_additional_matches(&additional);

        let next = album
            .relationships
            .get("items")
            .and_then(|items| items.links.as_ref())
            .and_then(|links| links.next.as_deref())
            .map(|link| self.resolve_link(link))
            .transpose()?;

        let mut raw = TidalRelease::new(album);
        raw.merge_included(first.included);

        let mut cursor = PageCursor::after_first(next);
        while let Some(url) = cursor.next_page() {
            ctx.transition(LookupState::Paginating {
                page: cursor.pages() + 1,
            });
            let page: dto::ItemsDocument = ctx.query_json(&url).await?;
            let next = page.next_link().map(|link| self.resolve_link(link)).transpose()?;
            raw.items.extend(page.data);
            raw.merge_included(page.included);
            cursor
                .advance(next)
                .map_err(|stop| LookupError::response(self.name(), url.as_str(), stop.to_string()))?;
        }

        tracing::debug!(
            provider = self.name(),
            pages = cursor.pages(),
            items = raw.items.len(),
            "Fetched album pages"
        );
        Ok(raw)
    }

    fn raw_id(&self, raw: &Self::Raw) -> String {
        raw.album.id.clone()
    }

    fn convert(&self, raw: Self::Raw, _ctx: &mut LookupContext<'_>) -> Result<Release> {
        adapter::to_release(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemorySnapshotStore;
    use crate::lookup::{LookupRequest, lookup_release};
    use crate::scheduler::QueryScheduler;
    use crate::scheduler::transport::mocks::MockTransport;
    use std::sync::Arc;

    const GTIN: &str = "602445790135";
    const PAGE_TWO: &str = "https://openapi.tidal.com/v2/albums/100/relationships/items?countryCode=GB&include=items,items.artists&page[cursor]=abc";

    fn first_page() -> String {
        r#"{
            "data": [{
                "id": "100", "type": "albums",
                "attributes": {"title": "Example", "barcodeId": "0602445790135",
                    "releaseDate": "2020-01-31", "copyright": {"text": "(P) 2020 Example"},
                    "type": "ALBUM"},
                "relationships": {
                    "artists": {"data": [{"id": "a1", "type": "artists"}]},
                    "items": {
                        "data": [
                            {"id": "t2", "type": "tracks", "meta": {"volumeNumber": 1, "trackNumber": 2}},
                            {"id": "t1", "type": "tracks", "meta": {"volumeNumber": 1, "trackNumber": 1}}
                        ],
                        "links": {"next": "/albums/100/relationships/items?countryCode=GB&include=items,items.artists&page[cursor]=abc"}
                    },
                    "coverArt": {"data": [{"id": "c1", "type": "artworks"}]},
                    "providers": {"data": [{"id": "p1", "type": "providers"}]}
                }
            }],
            "included": [
                {"id": "a1", "type": "artists", "attributes": {"name": "Jane Doe"}},
                {"id": "t1", "type": "tracks", "attributes": {"title": "Intro", "isrc": "GBAAA2000001", "duration": "PT1M"},
                 "relationships": {"artists": {"data": [{"id": "a1", "type": "artists"}]}}},
                {"id": "t2", "type": "tracks", "attributes": {"title": "Song", "version": "Radio Edit", "duration": "PT3M4S"},
                 "relationships": {"artists": {"data": [{"id": "a1", "type": "artists"}]}}},
                {"id": "c1", "type": "artworks", "attributes": {"files": [
                    {"href": "https://img/1280.jpg", "meta": {"width": 1280, "height": 1280}},
                    {"href": "https://img/320.jpg", "meta": {"width": 320, "height": 320}},
                    {"href": "https://img/80.jpg", "meta": {"width": 80, "height": 80}}
                ]}},
                {"id": "p1", "type": "providers", "attributes": {"name": "Example Records"}}
            ]
        }"#
        .to_string()
    }

    fn second_page(track_id: &str) -> String {
        format!(
            r#"{{
                "data": [{{"id": "{track_id}", "type": "tracks", "meta": {{"volumeNumber": 2, "trackNumber": 1}}}}],
                "included": [
                    {{"id": "a2", "type": "artists", "attributes": {{"name": "John Roe"}}}},
                    {{"id": "t3", "type": "tracks", "attributes": {{"title": "Bonus"}},
                     "relationships": {{"artists": {{"data": [{{"id": "a2", "type": "artists"}}]}}}}}}
                ],
                "links": {{"self": "/albums/100/relationships/items"}}
            }}"#
        )
    }

    fn setup(second: String) -> (Arc<MockTransport>, QueryScheduler) {
        let transport = Arc::new(MockTransport::new());
        let first_url = TidalProvider
            .construct_api_url(Some(LookupMethod::Gtin), GTIN, Some("GB"))
            .unwrap();
        transport.respond(first_url.as_str(), first_page());
        transport.respond(PAGE_TWO, second);
        let scheduler = QueryScheduler::new(
            "Tidal",
            transport.clone(),
            Arc::new(MemorySnapshotStore::default()),
            4,
        );
        (transport, scheduler)
    }

    #[test]
    fn test_construct_api_url() {
        let url = TidalProvider
            .construct_api_url(Some(LookupMethod::Id), "100", Some("gb"))
            .unwrap();
        assert_eq!(url.path(), "/v2/albums/100");
        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("countryCode".to_string(), "GB".to_string()));
        assert_eq!(pairs[1], ("include".to_string(), INCLUDE.to_string()));

        let url = TidalProvider
            .construct_api_url(Some(LookupMethod::Gtin), GTIN, None)
            .unwrap();
        assert_eq!(url.path(), "/v2/albums");
        assert!(url.query_pairs().any(|(k, v)| k == "filter[barcodeId]" && v == GTIN));

        assert!(TidalProvider.construct_api_url(None, GTIN, None).is_err());
    }

    #[test]
    fn test_extract_id() {
        for link in [
            "https://tidal.com/browse/album/100",
            "https://listen.tidal.com/album/100",
            "https://tidal.com/album/100/u",
        ] {
            let url = Url::parse(link).unwrap();
            assert_eq!(TidalProvider.extract_id(&url).unwrap().id, "100", "{}", link);
        }
        let url = Url::parse("https://tidal.com/browse/track/100").unwrap();
        assert!(TidalProvider.extract_id(&url).is_none());
    }

    #[tokio::test]
    async fn test_pages_are_merged_before_assembly() {
        let (transport, scheduler) = setup(second_page("t3"));
        let request = LookupRequest::by_gtin(GTIN).with_regions(&["GB"]);

        let release = lookup_release(&TidalProvider, &scheduler, &request).await.unwrap();

        assert_eq!(transport.request_count(), 2);
        assert_eq!(release.title, "Example");
        assert_eq!(release.gtin.as_deref(), Some("0602445790135"));
        assert_eq!(release.media.len(), 2);

        let first: Vec<_> = release.media[0].tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(first, vec!["Intro", "Song (Radio Edit)"]);
        assert_eq!(release.media[0].tracks[1].length, Some(184_000));

        let bonus = &release.media[1].tracks[0];
        assert_eq!(release.media[1].number, 2);
        assert_eq!(bonus.title, "Bonus");
        assert_eq!(bonus.artists[0].name, "John Roe");

        assert_eq!(release.labels[0].name, "Example Records");
        assert_eq!(release.copyright.as_deref(), Some("℗ 2020 Example"));
        assert_eq!(release.images[0].url, "https://img/1280.jpg");
        assert_eq!(release.images[0].thumb_url.as_deref(), Some("https://img/320.jpg"));
        assert_eq!(release.info.providers[0].region.as_deref(), Some("GB"));
    }

    #[tokio::test]
    async fn test_missing_side_table_entry_is_provider_error() {
        let (_, scheduler) = setup(second_page("t9"));
        let request = LookupRequest::by_gtin(GTIN).with_regions(&["GB"]);

        let result = lookup_release(&TidalProvider, &scheduler, &request).await;

        match result {
            Err(LookupError::Provider { provider, message }) => {
                assert_eq!(provider, "Tidal");
                assert!(message.contains("'t9'"), "{}", message);
            }
            other => panic!("expected provider error, got {:?}", other.map(|r| r.title)),
        }
    }

    #[tokio::test]
    async fn test_self_linking_page_fails_the_lookup() {
        let looping = r#"{
            "data": [{"id": "t3", "type": "tracks", "meta": {"volumeNumber": 2, "trackNumber": 1}}],
            "links": {"next": "/albums/100/relationships/items?countryCode=GB&include=items,items.artists&page[cursor]=abc"}
        }"#;
        let (transport, scheduler) = setup(looping.to_string());
        let request = LookupRequest::by_gtin(GTIN).with_regions(&["GB"]);

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            lookup_release(&TidalProvider, &scheduler, &request),
        )
        .await
        .expect("lookup must terminate");

        match result {
            Err(LookupError::Response { provider, url, message }) => {
                assert_eq!(provider, "Tidal");
                assert_eq!(url, Url::parse(PAGE_TWO).unwrap().as_str());
                assert!(message.contains("Pagination cycle"), "{}", message);
            }
            other => panic!("expected response error, got {:?}", other.map(|r| r.title)),
        }
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_replay_reproduces_pages() {
        let (transport, scheduler) = setup(second_page("t3"));
        let live = LookupRequest::by_gtin(GTIN).with_regions(&["GB"]);
        let first = lookup_release(&TidalProvider, &scheduler, &live).await.unwrap();
        let cache_time = first.info.providers[0].cache_time.unwrap();

        let replay = LookupRequest {
            snapshot_max_timestamp: Some(cache_time),
            strict_replay: true,
            ..live.clone()
        };
        let second = lookup_release(&TidalProvider, &scheduler, &replay).await.unwrap();

        assert_eq!(transport.request_count(), 2);
        assert_eq!(second.media, first.media);
        assert_eq!(second.info.providers[0].cache_time, Some(cache_time));
    }
}
