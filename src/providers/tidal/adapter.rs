//! Adapter layer: Convert Tidal DTOs to releases
//!
//! This is the ONLY place where Tidal DTO types are converted to the
//! canonical model. Every relationship is resolved against the accumulated
//! side table; a reference without a matching resource fails the conversion.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{TidalRelease, dto};
use crate::error::{LookupError, Result};
use crate::model::{
    ArtistCreditName, Artwork, ArtworkType, EntityId, ExternalLink, Label, LinkType, MediaType,
    PartialDate, Release, ReleaseGroupType, ReleasePackaging, ReleaseStatus, Track,
};
use crate::providers::{
    MIN_THUMBNAIL_WIDTH, PositionedTrack, assemble_media, select_largest, select_thumbnail,
};
use crate::reconcile::copyright::{PHONOGRAM, normalize_copyright};

const PROVIDER: &str = "Tidal";

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").expect("valid duration regex")
});

/// Public album page.
pub fn album_url(id: &str) -> String {
    format!("https://tidal.com/album/{}", id)
}

/// Convert accumulated pages into a release.
pub fn to_release(raw: &TidalRelease) -> Result<Release> {
    let album: dto::AlbumAttributes = decode(&raw.album)?;

    let artists = raw
        .album
        .related("artists")
        .iter()
        .map(|identifier| artist_credit(raw, identifier))
        .collect::<Result<Vec<_>>>()?;

    let items = raw
        .items
        .iter()
        .map(|identifier| positioned_track(raw, identifier))
        .collect::<Result<Vec<_>>>()?;

    let labels = raw
        .album
        .related("providers")
        .iter()
        .map(|identifier| {
            let attributes: dto::ProviderAttributes = decode(raw.lookup(identifier)?)?;
            Ok(Label::new(attributes.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let images = raw
        .album
        .related("coverArt")
        .iter()
        .map(|identifier| {
            let attributes: dto::ArtworkAttributes = decode(raw.lookup(identifier)?)?;
            Ok(artwork(&attributes))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    Ok(Release {
        title: album.title,
        artists,
        gtin: album.barcode_id,
        external_links: vec![ExternalLink {
            url: album_url(&raw.album.id),
            types: vec![LinkType::PaidStreaming],
        }],
        types: album
            .album_type
            .as_deref()
            .and_then(ReleaseGroupType::from_name)
            .into_iter()
            .collect(),
        release_date: album.release_date.as_deref().and_then(PartialDate::parse),
        copyright: album
            .copyright
            .as_ref()
            .map(|copyright| normalize_copyright(copyright.text(), Some(PHONOGRAM))),
        status: Some(ReleaseStatus::Official),
        packaging: Some(ReleasePackaging::None),
        images,
        labels,
        media: assemble_media(items, Some("Digital Media")),
        ..Default::default()
    })
}

fn decode<T: serde::de::DeserializeOwned>(resource: &dto::Resource) -> Result<T> {
    resource.attributes().map_err(|e| {
        LookupError::provider(
            PROVIDER,
            format!("Invalid {} resource '{}': {}", resource.kind, resource.id, e),
        )
    })
}

fn artist_credit(raw: &TidalRelease, identifier: &dto::ResourceIdentifier) -> Result<ArtistCreditName> {
    let attributes: dto::ArtistAttributes = decode(raw.lookup(identifier)?)?;
    Ok(ArtistCreditName {
        external_ids: vec![EntityId::new("tidal", "artist", identifier.id.clone())],
        ..ArtistCreditName::new(attributes.name)
    })
}

fn positioned_track(raw: &TidalRelease, identifier: &dto::ResourceIdentifier) -> Result<PositionedTrack> {
    let resource = raw.lookup(identifier)?;
    let attributes: dto::ItemAttributes = decode(resource)?;
    let meta = identifier.meta.ok_or_else(|| {
        LookupError::provider(
            PROVIDER,
            format!("Item '{}' has no position", identifier.id),
        )
    })?;

    let artists = resource
        .related("artists")
        .iter()
        .map(|artist| artist_credit(raw, artist))
        .collect::<Result<Vec<_>>>()?;

    let title = match attributes.version.as_deref().filter(|v| !v.is_empty()) {
        Some(version) => format!("{} ({})", attributes.title, version),
        None => attributes.title,
    };

    Ok(PositionedTrack {
        volume: meta.volume_number,
        position: meta.track_number,
        track: Track {
            number: meta.track_number.to_string(),
            title,
            length: attributes.duration.as_deref().and_then(parse_duration),
            isrc: attributes.isrc,
            artists,
            media_type: Some(if resource.kind == "videos" {
                MediaType::Video
            } else {
                MediaType::Audio
            }),
        },
    })
}

fn artwork(attributes: &dto::ArtworkAttributes) -> Option<Artwork> {
    let renditions: Vec<(u32, &str)> = attributes
        .files
        .iter()
        .map(|file| (file.meta.width, file.href.as_str()))
        .collect();
    let url = select_largest(&renditions)?;

    Some(Artwork {
        url: url.to_string(),
        thumb_url: select_thumbnail(&renditions, MIN_THUMBNAIL_WIDTH).map(String::from),
        types: BTreeSet::from([ArtworkType::Front]),
        comment: None,
        provider: Some(PROVIDER.to_string()),
    })
}

/// Parse an ISO 8601 duration such as `PT1H2M3.5S` into milliseconds.
pub fn parse_duration(value: &str) -> Option<u64> {
    let captures = ISO_DURATION.captures(value)?;
    let number = |index: usize| -> f64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0.0)
    };
    let seconds = number(1) * 3600.0 + number(2) * 60.0 + number(3);
    Some((seconds * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("PT3M4S"), Some(184_000));
        assert_eq!(parse_duration("PT1H"), Some(3_600_000));
        assert_eq!(parse_duration("PT0.5S"), Some(500));
        assert_eq!(parse_duration("3:04"), None);
    }

    #[test]
    fn test_album_url() {
        assert_eq!(album_url("42"), "https://tidal.com/album/42");
    }
}
