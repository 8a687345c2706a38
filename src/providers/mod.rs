//! Release providers.
//!
//! # Architecture
//!
//! Each provider follows the same split:
//! - **DTOs** (`dto.rs`) - exact API response shapes
//! - **Adapter** (`adapter.rs`) - the only place DTOs become [`Release`]s
//! - **Provider** (`mod.rs`) - request construction and fetching
//!
//! Providers implement [`ReleaseProvider`]; the closed set of supported
//! providers is [`AnyProvider`], which the combined lookup dispatches over.

pub mod itunes;
pub mod tidal;

use async_trait::async_trait;
use url::Url;

use crate::error::{LookupError, Result};
use crate::lookup::LookupContext;
use crate::model::{EntityId, LookupMethod, Medium, Release, Track};

pub use itunes::ItunesProvider;
pub use tidal::TidalProvider;

/// Minimum width of an image used as thumbnail.
pub const MIN_THUMBNAIL_WIDTH: u32 = 200;

/// What a provider can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderFeatures {
    /// Releases can be looked up by GTIN
    pub gtin_lookup: bool,
    /// Availability depends on the region
    pub regions: bool,
    /// Largest artwork size in pixels, if known
    pub max_image_size: Option<u32>,
}

/// Shared capability interface of all providers.
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    /// Raw data accumulated by [`fetch_raw`](Self::fetch_raw).
    type Raw: Send;

    /// Display name, e.g. "iTunes".
    fn name(&self) -> &'static str;

    /// Name used in permalinks and configuration, e.g. "itunes".
    fn internal_name(&self) -> &'static str;

    fn features(&self) -> ProviderFeatures;

    /// Build the API request for a lookup. Fails without a lookup method.
    fn construct_api_url(
        &self,
        method: Option<LookupMethod>,
        value: &str,
        region: Option<&str>,
    ) -> Result<Url>;

    /// Recognize a release URL of this provider.
    fn extract_id(&self, url: &Url) -> Option<EntityId>;

    /// Public page of a release.
    fn release_url(&self, id: &str, region: Option<&str>) -> String;

    /// Fetch everything needed for conversion, following regions and pages.
    async fn fetch_raw(
        &self,
        method: LookupMethod,
        value: &str,
        ctx: &mut LookupContext<'_>,
    ) -> Result<Self::Raw>;

    /// Provider ID of the fetched release.
    fn raw_id(&self, raw: &Self::Raw) -> String;

    /// Convert raw data into a release.
    fn convert(&self, raw: Self::Raw, ctx: &mut LookupContext<'_>) -> Result<Release>;

    /// Error for a method this provider does not support.
    fn unsupported(&self, what: &str) -> LookupError {
        LookupError::provider(self.name(), format!("{} is not supported", what))
    }
}

/// Closed set of supported providers.
pub enum AnyProvider {
    Itunes(ItunesProvider),
    Tidal(TidalProvider),
}

impl AnyProvider {
    /// All supported internal names, in default preference order.
    pub const INTERNAL_NAMES: [&'static str; 2] = ["itunes", "tidal"];

    /// Create a provider by internal name.
    pub fn from_internal_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "itunes" => Some(Self::Itunes(ItunesProvider)),
            "tidal" => Some(Self::Tidal(TidalProvider)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Itunes(p) => p.name(),
            Self::Tidal(p) => p.name(),
        }
    }

    pub fn internal_name(&self) -> &'static str {
        match self {
            Self::Itunes(p) => p.internal_name(),
            Self::Tidal(p) => p.internal_name(),
        }
    }

    pub fn features(&self) -> ProviderFeatures {
        match self {
            Self::Itunes(p) => p.features(),
            Self::Tidal(p) => p.features(),
        }
    }

    pub fn extract_id(&self, url: &Url) -> Option<EntityId> {
        match self {
            Self::Itunes(p) => p.extract_id(url),
            Self::Tidal(p) => p.extract_id(url),
        }
    }
}

/// Item of a tracklist with its position as reported by the provider.
#[derive(Debug, Clone)]
pub struct PositionedTrack {
    pub volume: u32,
    pub position: u32,
    pub track: Track,
}

/// Group tracks into media ordered by (volume, position).
///
/// A change of volume starts a new medium numbered after that volume, so
/// the first medium carries the first volume number encountered. An empty
/// tracklist yields one empty medium.
pub fn assemble_media(mut items: Vec<PositionedTrack>, format: Option<&str>) -> Vec<Medium> {
    items.sort_by_key(|item| (item.volume, item.position));

    let mut media: Vec<Medium> = Vec::new();
    for item in items {
        match media.last_mut() {
            Some(medium) if medium.number == item.volume => medium.tracks.push(item.track),
            _ => media.push(Medium {
                number: item.volume,
                format: format.map(String::from),
                title: None,
                tracks: vec![item.track],
            }),
        }
    }

    if media.is_empty() {
        let mut medium = Medium::empty(1);
        medium.format = format.map(String::from);
        media.push(medium);
    }
    media
}

/// Smallest rendition that is at least `min_width` wide.
pub fn select_thumbnail<'a>(renditions: &[(u32, &'a str)], min_width: u32) -> Option<&'a str> {
    renditions
        .iter()
        .filter(|(width, _)| *width >= min_width)
        .min_by_key(|(width, _)| *width)
        .map(|(_, url)| *url)
}

/// Largest rendition.
pub fn select_largest<'a>(renditions: &[(u32, &'a str)]) -> Option<&'a str> {
    renditions
        .iter()
        .max_by_key(|(width, _)| *width)
        .map(|(_, url)| *url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(volume: u32, position: u32, title: &str) -> PositionedTrack {
        PositionedTrack {
            volume,
            position,
            track: Track {
                number: position.to_string(),
                title: title.to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_assemble_media_groups_by_volume() {
        let media = assemble_media(
            vec![item(2, 1, "c"), item(1, 2, "b"), item(1, 1, "a"), item(2, 2, "d")],
            Some("Digital Media"),
        );

        assert_eq!(media.len(), 2);
        assert_eq!(media[0].number, 1);
        assert_eq!(media[1].number, 2);
        let titles: Vec<_> = media[0].tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(media[1].format.as_deref(), Some("Digital Media"));
    }

    #[test]
    fn test_first_medium_uses_first_volume_number() {
        let media = assemble_media(vec![item(3, 1, "x"), item(5, 1, "y")], None);
        assert_eq!(media.iter().map(|m| m.number).collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn test_empty_tracklist_is_one_empty_medium() {
        let media = assemble_media(Vec::new(), None);
        assert_eq!(media.len(), 1);
        assert!(media[0].tracks.is_empty());
    }

    #[test]
    fn test_thumbnail_selection() {
        let renditions = [(80, "small"), (320, "medium"), (1280, "large"), (640, "big")];
        assert_eq!(select_thumbnail(&renditions, MIN_THUMBNAIL_WIDTH), Some("medium"));
        assert_eq!(select_largest(&renditions), Some("large"));
        assert_eq!(select_thumbnail(&[(80, "small")], MIN_THUMBNAIL_WIDTH), None);
    }

    #[test]
    fn test_provider_registry() {
        let provider = AnyProvider::from_internal_name("iTunes").unwrap();
        assert_eq!(provider.internal_name(), "itunes");
        assert!(AnyProvider::from_internal_name("deezer").is_none());
        for name in AnyProvider::INTERNAL_NAMES {
            assert!(AnyProvider::from_internal_name(name).is_some());
        }
    }
}
