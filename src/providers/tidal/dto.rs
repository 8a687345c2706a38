//! Tidal API v2 Data Transfer Objects
//!
//! The API speaks JSON:API: primary `data` resources reference each other
//! through `relationships`, and related resources are delivered once in the
//! `included` side table.
//! DO NOT use these types outside the tidal module - convert to releases.
//!
//! API Reference: https://developer.tidal.com/apiref

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Top-level document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document<D> {
    pub data: D,
    #[serde(default)]
    pub included: Vec<Resource>,
    pub links: Option<Links>,
}

impl<D> Document<D> {
    pub fn next_link(&self) -> Option<&str> {
        self.links.as_ref().and_then(|links| links.next.as_deref())
    }
}

/// First page of an album lookup; a barcode filter returns a list
pub type AlbumDocument = Document<OneOrMany<Resource>>;

/// Further page of an album's items relationship
pub type ItemsDocument = Document<Vec<ResourceIdentifier>>;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Many(items) if items.is_empty())
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Option<String>,
    pub next: Option<String>,
}

/// Resource with type-specific attributes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

impl Resource {
    /// Decode the attributes as the shape of this resource type.
    pub fn attributes<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.attributes)
    }

    /// Identifiers of a relationship, empty if absent.
    pub fn related(&self, name: &str) -> Vec<ResourceIdentifier> {
        self.relationships
            .get(name)
            .and_then(|relationship| relationship.data.clone())
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Relationship {
    pub data: Option<OneOrMany<ResourceIdentifier>>,
    pub links: Option<Links>,
}

/// Reference to a resource in the side table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceIdentifier {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub meta: Option<ItemMeta>,
}

/// Position of an album item
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    pub volume_number: u32,
    pub track_number: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAttributes {
    pub title: String,
    pub barcode_id: Option<String>,
    pub number_of_volumes: Option<u32>,
    pub number_of_items: Option<u32>,
    /// ISO 8601 date
    pub release_date: Option<String>,
    pub copyright: Option<Copyright>,
    /// "ALBUM", "EP" or "SINGLE"
    #[serde(rename = "type")]
    pub album_type: Option<String>,
}

/// Copyright line, a plain string in older API revisions
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Copyright {
    Text(String),
    Object { text: String },
}

impl Copyright {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Object { text } => text,
        }
    }
}

/// Attributes of `tracks` and `videos`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttributes {
    pub title: String,
    pub version: Option<String>,
    pub isrc: Option<String>,
    /// ISO 8601 duration, e.g. "PT3M4S"
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistAttributes {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtworkAttributes {
    #[serde(default)]
    pub files: Vec<ArtworkFile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtworkFile {
    pub href: String,
    pub meta: ArtworkFileMeta,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ArtworkFileMeta {
    pub width: u32,
    pub height: u32,
}

/// Content provider (label)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderAttributes {
    pub name: String,
}
