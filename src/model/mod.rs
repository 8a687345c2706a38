//! Canonical release data model.
//!
//! Every provider normalizes its payloads into these types. They are created
//! fresh for each lookup and only the reconciliation passes in
//! [`crate::reconcile`] touch them after a provider has returned.
//!
//! # Entity identity
//!
//! Artists and labels implement [`Resolvable`]: identity for deduplication is
//! the database ID (MBID) when present, else the exact name.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A release as reported by one provider, or the merged result of several.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub title: String,
    pub artists: Vec<ArtistCreditName>,
    /// Barcode, kept exactly as the provider reported it
    pub gtin: Option<String>,
    pub external_links: Vec<ExternalLink>,
    pub types: BTreeSet<ReleaseGroupType>,
    pub release_date: Option<PartialDate>,
    pub copyright: Option<String>,
    pub status: Option<ReleaseStatus>,
    pub packaging: Option<ReleasePackaging>,
    pub images: Vec<Artwork>,
    pub labels: Vec<Label>,
    pub language: Option<Language>,
    pub script: Option<Script>,
    /// Never empty when the provider reported any release: a missing
    /// tracklist is a single empty medium.
    pub media: Vec<Medium>,
    pub info: ReleaseInfo,
}

impl Release {
    /// Iterate over all tracks of all media in order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.media.iter().flat_map(|medium| medium.tracks.iter())
    }

    /// Total number of tracks across all media.
    pub fn track_count(&self) -> usize {
        self.media.iter().map(|medium| medium.tracks.len()).sum()
    }

    /// Release title followed by every track title.
    pub fn all_titles(&self) -> Vec<&str> {
        std::iter::once(self.title.as_str())
            .chain(self.tracks().map(|track| track.title.as_str()))
            .collect()
    }

    /// Render the release artist credit as a single string.
    pub fn credit_string(&self) -> String {
        credit_string(&self.artists)
    }
}

/// One disc, side or digital volume of a release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medium {
    /// 1-based position; gaps are allowed
    pub number: u32,
    pub format: Option<String>,
    pub title: Option<String>,
    pub tracks: Vec<Track>,
}

impl Medium {
    /// An empty medium, used when a provider reports no tracklist.
    pub fn empty(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Numeric ("7") or catalog style ("B7")
    pub number: String,
    pub title: String,
    /// Duration in milliseconds
    pub length: Option<u64>,
    pub isrc: Option<String>,
    pub artists: Vec<ArtistCreditName>,
    pub media_type: Option<MediaType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
}

/// A single entry of an artist credit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistCreditName {
    pub name: String,
    /// Display name on this release, defaults to `name`
    pub credited_name: Option<String>,
    /// Joins this credit with the next one (e.g. " & ")
    pub join_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<EntityId>,
    pub mbid: Option<String>,
}

impl ArtistCreditName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name shown in the credit.
    pub fn credited(&self) -> &str {
        self.credited_name.as_deref().unwrap_or(&self.name)
    }
}

/// Render a credit list; the final entry never contributes its join phrase.
pub fn credit_string(credits: &[ArtistCreditName]) -> String {
    let mut result = String::new();
    for (index, credit) in credits.iter().enumerate() {
        result.push_str(credit.credited());
        if index + 1 < credits.len() {
            result.push_str(credit.join_phrase.as_deref().unwrap_or(", "));
        }
    }
    result
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub name: String,
    pub catalog_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<EntityId>,
    pub mbid: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Identifier of an entity in a provider's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityId {
    /// Internal provider name, e.g. "itunes"
    pub provider: String,
    /// Provider entity type, e.g. "artist" or "album"
    pub entity_type: String,
    pub id: String,
    pub region: Option<String>,
}

impl EntityId {
    pub fn new(provider: &str, entity_type: &str, id: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            entity_type: entity_type.to_string(),
            id: id.into(),
            region: None,
        }
    }
}

/// An entity that can be matched against the central database.
pub trait Resolvable {
    fn name(&self) -> Option<&str>;
    fn mbid(&self) -> Option<&str>;
}

impl Resolvable for ArtistCreditName {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|name| !name.is_empty())
    }

    fn mbid(&self) -> Option<&str> {
        self.mbid.as_deref()
    }
}

impl Resolvable for Label {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|name| !name.is_empty())
    }

    fn mbid(&self) -> Option<&str> {
        self.mbid.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLink {
    pub url: String,
    pub types: Vec<LinkType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    PaidDownload,
    FreeDownload,
    PaidStreaming,
    FreeStreaming,
}

/// Release group types. Primary and secondary types share one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReleaseGroupType {
    Album,
    Single,
    #[serde(rename = "EP")]
    Ep,
    Broadcast,
    Other,
    Compilation,
    Soundtrack,
    Live,
    Remix,
    Demo,
}

impl ReleaseGroupType {
    /// Parse a type name case-insensitively ("ep", "Single", "LIVE").
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_lowercase().as_str() {
            "album" => Self::Album,
            "single" => Self::Single,
            "ep" => Self::Ep,
            "broadcast" => Self::Broadcast,
            "other" => Self::Other,
            "compilation" => Self::Compilation,
            "soundtrack" => Self::Soundtrack,
            "live" => Self::Live,
            "remix" => Self::Remix,
            "demo" => Self::Demo,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ReleaseGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Album => "Album",
            Self::Single => "Single",
            Self::Ep => "EP",
            Self::Broadcast => "Broadcast",
            Self::Other => "Other",
            Self::Compilation => "Compilation",
            Self::Soundtrack => "Soundtrack",
            Self::Live => "Live",
            Self::Remix => "Remix",
            Self::Demo => "Demo",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseStatus {
    Official,
    Promotion,
    Bootleg,
    PseudoRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleasePackaging {
    None,
    JewelCase,
    Digipak,
    Other,
}

/// A date where any component may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: Option<u16>,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl PartialDate {
    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`, ignoring any time suffix.
    pub fn parse(value: &str) -> Option<Self> {
        let date = value.split('T').next()?.trim();
        let mut parts = date.split('-');
        let year = parts.next()?.parse().ok()?;
        let month = parts.next().and_then(|m| m.parse().ok());
        let day = parts.next().and_then(|d| d.parse().ok());
        Some(Self {
            year: Some(year),
            month,
            day,
        })
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.year, self.month, self.day) {
            (Some(y), Some(m), Some(d)) => write!(f, "{:04}-{:02}-{:02}", y, m, d),
            (Some(y), Some(m), None) => write!(f, "{:04}-{:02}", y, m),
            (Some(y), None, _) => write!(f, "{:04}", y),
            _ => f.write_str("????"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub url: String,
    /// Smallest rendition that is still wide enough, if any
    pub thumb_url: Option<String>,
    pub types: BTreeSet<ArtworkType>,
    pub comment: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkType {
    Front,
    Back,
    Booklet,
    Medium,
    Track,
    Other,
}

/// ISO 639-3 language code with the detector's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub confidence: Option<f64>,
}

/// ISO 15924 script code with its share of classified characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub code: String,
    pub frequency: Option<f64>,
}

/// How a provider was asked for the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMethod {
    Gtin,
    Id,
}

impl fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gtin => f.write_str("gtin"),
            Self::Id => f.write_str("id"),
        }
    }
}

/// Record of one provider's part in a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    /// Display name, e.g. "iTunes"
    pub name: String,
    /// Internal name used in permalinks, e.g. "itunes"
    pub internal_name: String,
    pub lookup_method: LookupMethod,
    /// GTIN or ID the provider was queried with
    pub lookup_value: String,
    pub region: Option<String>,
    /// Provider's ID of the resolved release
    pub id: String,
    pub url: String,
    /// Newest snapshot timestamp used by this lookup (unix seconds)
    pub cache_time: Option<i64>,
    pub is_template: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub providers: Vec<ProviderInfo>,
    /// Diagnostics in pipeline execution order
    pub messages: Vec<ProviderMessage>,
}

impl ReleaseInfo {
    pub fn push(&mut self, severity: MessageSeverity, text: impl Into<String>) {
        self.messages.push(ProviderMessage {
            severity,
            text: text.into(),
            provider: None,
        });
    }

    pub fn push_for(
        &mut self,
        provider: &str,
        severity: MessageSeverity,
        text: impl Into<String>,
    ) {
        self.messages.push(ProviderMessage {
            severity,
            text: text.into(),
            provider: Some(provider.to_string()),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub severity: MessageSeverity,
    pub text: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Debug,
    Warning,
    Error,
}
