//! Adapter layer: Convert iTunes DTOs to releases
//!
//! This is the ONLY place where iTunes DTO types are converted to the
//! canonical model.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::dto;
use crate::error::{LookupError, Result};
use crate::model::{
    ArtistCreditName, Artwork, ArtworkType, EntityId, ExternalLink, LinkType, MediaType,
    PartialDate, Release, ReleaseGroupType, ReleasePackaging, ReleaseStatus, Track,
};
use crate::providers::{PositionedTrack, assemble_media};
use crate::reconcile::copyright::{PHONOGRAM, normalize_copyright};

/// Provider name used in errors and entity IDs.
const PROVIDER: &str = "iTunes";

static TYPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s-\s(EP|Single)$").expect("valid suffix regex"));

static ARTWORK_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+x\d+(bb)?\.(jpg|png|webp)$").expect("valid artwork regex"));

/// Largest artwork size served by the image CDN.
pub const FULL_ARTWORK_SIZE: u32 = 3000;

/// Size of generated thumbnails.
pub const THUMBNAIL_SIZE: u32 = 250;

/// Convert a lookup response into a release.
///
/// The first collection is the release; the view URLs of any further
/// collections are returned as additional matches.
pub fn to_release(
    response: &dto::LookupResponse,
    gtin: Option<&str>,
) -> Result<(Release, Vec<String>)> {
    let mut collections = response.collections();
    let collection = collections
        .next()
        .ok_or_else(|| LookupError::provider(PROVIDER, "Response contains no collection"))?;
    let additional: Vec<String> = collections
        .map(|other| clean_view_url(&other.collection_view_url))
        .collect();

    let (title, suffix_type) = split_type_suffix(&collection.collection_name);
    let artist = artist_credit(&collection.artist_name, collection.artist_id);

    let items = response
        .tracks()
        .filter(|track| track.collection_id == collection.collection_id)
        .map(|track| PositionedTrack {
            volume: track.disc_number.unwrap_or(1),
            position: track.track_number.unwrap_or(0),
            track: convert_track(track),
        })
        .collect();

    let release = Release {
        title,
        artists: vec![artist],
        gtin: gtin.map(String::from),
        external_links: vec![ExternalLink {
            url: clean_view_url(&collection.collection_view_url),
            types: vec![LinkType::PaidDownload, LinkType::PaidStreaming],
        }],
        types: suffix_type.into_iter().collect(),
        release_date: collection
            .release_date
            .as_deref()
            .and_then(PartialDate::parse),
        copyright: collection
            .copyright
            .as_deref()
            .map(|text| normalize_copyright(text, Some(PHONOGRAM))),
        status: Some(ReleaseStatus::Official),
        packaging: Some(ReleasePackaging::None),
        images: collection.artwork_url100.as_deref().map(artwork).into_iter().collect(),
        media: assemble_media(items, Some("Digital Media")),
        ..Default::default()
    };

    Ok((release, additional))
}

fn convert_track(track: &dto::Track) -> Track {
    Track {
        number: track.track_number.unwrap_or(0).to_string(),
        title: track.track_name.clone(),
        length: track.track_time_millis,
        isrc: None,
        artists: vec![artist_credit(&track.artist_name, track.artist_id)],
        media_type: Some(match track.kind.as_deref() {
            Some("music-video") => MediaType::Video,
            _ => MediaType::Audio,
        }),
    }
}

fn artist_credit(name: &str, id: Option<u64>) -> ArtistCreditName {
    ArtistCreditName {
        external_ids: id
            .map(|id| EntityId::new("itunes", "artist", id.to_string()))
            .into_iter()
            .collect(),
        ..ArtistCreditName::new(name)
    }
}

/// Strip the store's " - EP" / " - Single" title suffix.
fn split_type_suffix(title: &str) -> (String, Option<ReleaseGroupType>) {
    match TYPE_SUFFIX.captures(title) {
        Some(captures) => {
            let kind = captures.get(1).and_then(|m| ReleaseGroupType::from_name(m.as_str()));
            let stripped = TYPE_SUFFIX.replace(title, "");
            (stripped.into_owned(), kind)
        }
        None => (title.to_string(), None),
    }
}

/// Drop tracking parameters from a store URL.
fn clean_view_url(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

/// Rewrite an artwork URL to a different square size.
pub fn resize_artwork(url: &str, size: u32) -> String {
    ARTWORK_SIZE
        .replace(url, format!("/{size}x{size}bb.$2").as_str())
        .into_owned()
}

fn artwork(url: &str) -> Artwork {
    Artwork {
        url: resize_artwork(url, FULL_ARTWORK_SIZE),
        thumb_url: Some(resize_artwork(url, THUMBNAIL_SIZE)),
        types: BTreeSet::from([ArtworkType::Front]),
        comment: None,
        provider: Some(PROVIDER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> dto::LookupResponse {
        serde_json::from_str(json).unwrap()
    }

    const TWO_DISCS: &str = r#"{
        "resultCount": 5,
        "results": [
            {"wrapperType": "collection", "collectionId": 1, "collectionName": "Example - EP",
             "artistId": 7, "artistName": "Jane Doe",
             "collectionViewUrl": "https://music.apple.com/gb/album/example-ep/1?uo=4",
             "artworkUrl100": "https://is1.mzstatic.com/image/thumb/a/100x100bb.jpg",
             "copyright": "2016 Example Records", "releaseDate": "2016-05-06T07:00:00Z"},
            {"wrapperType": "track", "kind": "song", "trackId": 13, "collectionId": 1,
             "artistName": "Jane Doe", "trackName": "Outro", "discNumber": 2, "trackNumber": 1},
            {"wrapperType": "track", "kind": "song", "trackId": 12, "collectionId": 1,
             "artistName": "Jane Doe", "trackName": "Middle", "discNumber": 1, "trackNumber": 2},
            {"wrapperType": "track", "kind": "music-video", "trackId": 11, "collectionId": 1,
             "artistName": "Jane Doe", "trackName": "Intro", "discNumber": 1, "trackNumber": 1,
             "trackTimeMillis": 1000},
            {"wrapperType": "collection", "collectionId": 2, "collectionName": "Example (Deluxe)",
             "artistName": "Jane Doe",
             "collectionViewUrl": "https://music.apple.com/gb/album/example-deluxe/2?uo=4"}
        ]
    }"#;

    #[test]
    fn test_converts_collection() {
        let (release, additional) =
            to_release(&response(TWO_DISCS), Some("602445790135")).unwrap();

        assert_eq!(release.title, "Example");
        assert!(release.types.contains(&ReleaseGroupType::Ep));
        assert_eq!(release.gtin.as_deref(), Some("602445790135"));
        assert_eq!(release.credit_string(), "Jane Doe");
        assert_eq!(release.artists[0].external_ids[0].id, "7");
        assert_eq!(release.copyright.as_deref(), Some("℗ 2016 Example Records"));
        assert_eq!(release.release_date.unwrap().year, Some(2016));
        assert_eq!(
            release.external_links[0].url,
            "https://music.apple.com/gb/album/example-ep/1"
        );
        assert_eq!(
            additional,
            vec!["https://music.apple.com/gb/album/example-deluxe/2".to_string()]
        );
    }

    #[test]
    fn test_tracks_sorted_by_disc_and_number() {
        let (release, _) = to_release(&response(TWO_DISCS), None).unwrap();

        assert_eq!(release.media.len(), 2);
        let first: Vec<_> = release.media[0].tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(first, vec!["Intro", "Middle"]);
        assert_eq!(release.media[0].tracks[0].media_type, Some(MediaType::Video));
        assert_eq!(release.media[0].tracks[0].length, Some(1000));
        assert_eq!(release.media[1].number, 2);
    }

    #[test]
    fn test_artwork_sizes() {
        let (release, _) = to_release(&response(TWO_DISCS), None).unwrap();
        let image = &release.images[0];
        assert_eq!(image.url, "https://is1.mzstatic.com/image/thumb/a/3000x3000bb.jpg");
        assert_eq!(
            image.thumb_url.as_deref(),
            Some("https://is1.mzstatic.com/image/thumb/a/250x250bb.jpg")
        );
    }

    #[test]
    fn test_no_collection_is_provider_error() {
        let result = to_release(&response(r#"{"resultCount": 0, "results": []}"#), None);
        assert!(matches!(result, Err(LookupError::Provider { .. })));
    }

    #[test]
    fn test_missing_tracklist_is_empty_medium() {
        let json = r#"{"resultCount": 1, "results": [
            {"wrapperType": "collection", "collectionId": 1, "collectionName": "Solo",
             "artistName": "X", "collectionViewUrl": "https://music.apple.com/us/album/solo/1"}
        ]}"#;
        let (release, _) = to_release(&response(json), None).unwrap();
        assert_eq!(release.media.len(), 1);
        assert!(release.media[0].tracks.is_empty());
    }
}
