//! Permalinks: URLs that reproduce a combined lookup.
//!
//! Query parameters:
//! - `<provider>=<id>`: provider looked up by ID
//! - `<provider>=`: provider looked up by GTIN
//! - `<provider>!=<id>`: provider used as a template
//! - `gtin=<value>`: longest equivalent GTIN used by any provider
//! - `region=<CC>`: region the release was found in
//! - `ts=<unix seconds>`: snapshot ceiling for replay

use url::Url;

use crate::error::{LookupError, Result};
use crate::model::{LookupMethod, ProviderInfo};
use crate::text::gtin;

use super::combined::{CombinedRequest, ProviderSelection};
use super::request::validate_region;

const TEMPLATE_SUFFIX: char = '!';

/// Decoded permalink state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permalink {
    pub gtin: Option<String>,
    pub providers: Vec<ProviderSelection>,
    pub region: Option<String>,
    pub timestamp: Option<i64>,
}

impl Permalink {
    /// Describe a finished lookup. The ceiling is the newest snapshot used.
    pub fn from_infos(infos: &[ProviderInfo]) -> Self {
        let mut providers: Vec<ProviderSelection> = Vec::new();
        for info in infos {
            if providers.iter().any(|p| p.internal_name == info.internal_name) {
                continue;
            }
            let id = match (info.is_template, info.lookup_method) {
                (false, LookupMethod::Gtin) => None,
                _ => Some(info.id.clone()),
            };
            providers.push(ProviderSelection {
                internal_name: info.internal_name.clone(),
                id,
                is_template: info.is_template,
            });
        }

        let gtin = gtin::longest_variant(
            infos
                .iter()
                .filter(|info| !info.is_template && info.lookup_method == LookupMethod::Gtin)
                .map(|info| info.lookup_value.as_str()),
        )
        .map(String::from);

        Self {
            gtin,
            providers,
            region: infos.iter().find_map(|info| info.region.clone()),
            timestamp: infos.iter().filter_map(|info| info.cache_time).max(),
        }
    }

    /// Encode as query parameters of `base`.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            if let Some(gtin) = &self.gtin {
                query.append_pair("gtin", gtin);
            }
            for provider in &self.providers {
                if provider.is_template {
                    let key = format!("{}{}", provider.internal_name, TEMPLATE_SUFFIX);
                    query.append_pair(&key, provider.id.as_deref().unwrap_or_default());
                } else {
                    query.append_pair(&provider.internal_name, provider.id.as_deref().unwrap_or_default());
                }
            }
            if let Some(region) = &self.region {
                query.append_pair("region", region);
            }
            if let Some(timestamp) = self.timestamp {
                query.append_pair("ts", &timestamp.to_string());
            }
        }
        url
    }

    /// Decode a permalink. Parameters naming unknown providers are ignored.
    pub fn parse(url: &Url, known_providers: &[&str]) -> Result<Self> {
        let mut permalink = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "gtin" => permalink.gtin = Some(gtin::parse(&value)?),
                "region" => permalink.region = Some(validate_region(&value)?),
                "ts" => {
                    let timestamp = value.parse::<i64>().map_err(|_| {
                        LookupError::invalid_input(format!("'{}' is not a valid timestamp", value))
                    })?;
                    permalink.timestamp = Some(timestamp);
                }
                key => {
                    let (name, is_template) = match key.strip_suffix(TEMPLATE_SUFFIX) {
                        Some(name) => (name, true),
                        None => (key, false),
                    };
                    let Some(known) = known_providers
                        .iter()
                        .find(|known| known.eq_ignore_ascii_case(name))
                    else {
                        tracing::debug!(parameter = key, "Ignoring unknown permalink parameter");
                        continue;
                    };
                    permalink.providers.push(ProviderSelection {
                        internal_name: known.to_string(),
                        id: (!value.is_empty()).then(|| value.to_string()),
                        is_template,
                    });
                }
            }
        }
        Ok(permalink)
    }

    /// Request that replays this permalink.
    pub fn into_request(self, default_regions: &[String]) -> CombinedRequest {
        CombinedRequest {
            gtin: self.gtin,
            providers: self.providers,
            regions: match self.region {
                Some(region) => vec![region],
                None => default_regions.to_vec(),
            },
            snapshot_max_timestamp: self.timestamp,
        }
    }
}
