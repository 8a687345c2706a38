//! Lookup requests.

use crate::error::{LookupError, Result};
use crate::model::LookupMethod;
use crate::scheduler::SnapshotPolicy;
use crate::text::gtin;

/// A single provider lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub gtin: Option<String>,
    /// Provider-specific release ID
    pub id: Option<String>,
    /// Regions in priority order (ISO 3166-1 alpha-2)
    pub regions: Vec<String>,
    /// Replay snapshots at or before this unix timestamp
    pub snapshot_max_timestamp: Option<i64>,
    /// With a ceiling, fail instead of fetching missing snapshots live
    pub strict_replay: bool,
    /// With a ceiling, accept a mix of cached and live pages
    pub allow_mixed_freshness: bool,
    /// The provider only supplies extra field values
    pub is_template: bool,
}

impl LookupRequest {
    pub fn by_gtin(value: impl Into<String>) -> Self {
        Self {
            gtin: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn by_id(value: impl Into<String>) -> Self {
        Self {
            id: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = regions.iter().map(|r| r.to_string()).collect();
        self
    }

    /// The lookup method, preferring an ID over a GTIN.
    pub fn method(&self) -> Option<(LookupMethod, &str)> {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Some((LookupMethod::Id, id));
        }
        self.gtin
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(|value| (LookupMethod::Gtin, value))
    }

    /// Validate the request before any network activity.
    pub fn validate(&self) -> Result<(LookupMethod, &str)> {
        let (method, value) = self.method().ok_or_else(|| {
            LookupError::invalid_input("Either a GTIN or a provider ID is required")
        })?;
        if method == LookupMethod::Gtin && !gtin::is_valid(value) {
            return Err(LookupError::invalid_input(format!("'{}' is not a valid GTIN", value)));
        }
        for region in &self.regions {
            validate_region(region)?;
        }
        Ok((method, value))
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy {
            max_timestamp: self.snapshot_max_timestamp,
            strict: self.strict_replay,
        }
    }
}

/// Check that a region code consists of exactly two ASCII letters.
pub fn validate_region(region: &str) -> Result<String> {
    if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(region.to_ascii_uppercase())
    } else {
        Err(LookupError::invalid_input(format!(
            "'{}' is not a two-letter region code",
            region
        )))
    }
}
