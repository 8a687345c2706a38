//! iTunes Search API Data Transfer Objects
//!
//! These types match what the `/lookup` endpoint returns.
//! DO NOT use these types outside the itunes module - convert to releases.
//!
//! API Reference: https://performance-partners.apple.com/search-api

use serde::{Deserialize, Serialize};

/// Lookup response: the collection followed by its songs
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<LookupResult>,
}

impl LookupResponse {
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.results.iter().filter_map(|result| match result {
            LookupResult::Collection(collection) => Some(collection),
            _ => None,
        })
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.results.iter().filter_map(|result| match result {
            LookupResult::Track(track) => Some(track),
            _ => None,
        })
    }
}

/// One result, discriminated by `wrapperType`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "wrapperType", rename_all = "camelCase")]
pub enum LookupResult {
    Collection(Collection),
    Track(Track),
    #[serde(other)]
    Other,
}

/// Album, EP or single
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_id: u64,
    pub collection_name: String,
    pub artist_id: Option<u64>,
    pub artist_name: String,
    pub artist_view_url: Option<String>,
    pub collection_view_url: String,
    /// 100x100 cover; larger sizes are derived from this URL
    pub artwork_url100: Option<String>,
    pub copyright: Option<String>,
    /// ISO 8601 timestamp
    pub release_date: Option<String>,
    pub track_count: Option<u32>,
    /// Three-letter country code of the store
    pub country: Option<String>,
}

/// Song or music video
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// "song" or "music-video"
    pub kind: Option<String>,
    pub track_id: u64,
    pub collection_id: u64,
    pub artist_id: Option<u64>,
    pub artist_name: String,
    pub track_name: String,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
    pub track_time_millis: Option<u64>,
}
