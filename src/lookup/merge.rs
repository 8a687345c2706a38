//! Merging per-provider releases into one release.
//!
//! Fields are taken in provider preference order, with template providers
//! consulted only after all primary providers. Values that must be unique
//! across providers (the GTIN) fail the merge when they conflict.

use crate::error::{LookupError, Result};
use crate::model::{ArtistCreditName, MessageSeverity, Release};
use crate::reconcile::{self, LanguageDetector, dedupe};
use crate::text::{find_similar, gtin, similar_names};

use super::ProviderReleaseMap;

/// A release together with the name of the provider that returned it.
type Source<'a> = (&'a str, &'a Release);

fn is_template(release: &Release) -> bool {
    !release.info.providers.is_empty() && release.info.providers.iter().all(|p| p.is_template)
}

fn display_name<'a>(source: &Source<'a>) -> &'a str {
    source
        .1
        .info
        .providers
        .first()
        .map(|info| info.name.as_str())
        .unwrap_or(source.0)
}

/// Merge all successful lookups and run the reconciliation passes.
pub fn merge_releases(
    results: &ProviderReleaseMap,
    detector: &dyn LanguageDetector,
) -> Result<Release> {
    let (primary, templates): (Vec<Source>, Vec<Source>) =
        results.releases().partition(|(_, release)| !is_template(release));
    let Some(&(_, first)) = primary.first() else {
        return Err(LookupError::not_found(
            "all providers",
            "No provider returned a release",
        ));
    };
    let sources: Vec<Source> = primary.iter().chain(templates.iter()).copied().collect();

    let mut merged = Release {
        title: first.title.clone(),
        gtin: merge_gtin(&primary)?,
        status: sources.iter().find_map(|(_, r)| r.status),
        packaging: sources.iter().find_map(|(_, r)| r.packaging),
        release_date: sources.iter().find_map(|(_, r)| r.release_date),
        copyright: sources.iter().find_map(|(_, r)| r.copyright.clone()),
        language: sources.iter().find_map(|(_, r)| r.language.clone()),
        script: sources.iter().find_map(|(_, r)| r.script.clone()),
        media: first.media.clone(),
        ..Default::default()
    };

    for (_, release) in &sources {
        merged.types.extend(release.types.iter().copied());
        merged.images.extend(release.images.iter().cloned());
        for link in &release.external_links {
            if !merged.external_links.iter().any(|l| l.url == link.url) {
                merged.external_links.push(link.clone());
            }
        }
        merged.info.providers.extend(release.info.providers.iter().cloned());
        merged.info.messages.extend(release.info.messages.iter().cloned());
    }

    merged.labels = dedupe(sources.iter().flat_map(|(_, r)| r.labels.iter().cloned()));

    merged.artists = sources
        .iter()
        .map(|(_, r)| &r.artists)
        .find(|artists| !artists.is_empty())
        .cloned()
        .unwrap_or_default();
    for (_, release) in &sources {
        align_artists(&mut merged.artists, &release.artists);
    }
    merged.artists = dedupe(merged.artists);

    check_titles(&mut merged, &primary);
    fill_tracks(&mut merged, &sources);

    Ok(reconcile::finalize(merged, detector))
}

/// Pick the longest GTIN variant; non-equivalent values conflict.
fn merge_gtin(sources: &[Source]) -> Result<Option<String>> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for source in sources {
        let Some(value) = source.1.gtin.as_deref() else {
            continue;
        };
        let provider = display_name(source).to_string();
        match groups.iter_mut().find(|(known, _)| gtin::equivalent(known, value)) {
            Some((known, providers)) => {
                if value.len() > known.len() {
                    *known = value.to_string();
                }
                providers.push(provider);
            }
            None => groups.push((value.to_string(), vec![provider])),
        }
    }

    match groups.len() {
        0 => Ok(None),
        1 => Ok(groups.pop().map(|(value, _)| value)),
        _ => Err(LookupError::Compatibility {
            field: "GTIN".to_string(),
            values: groups,
        }),
    }
}

/// Warn when primary providers report dissimilar titles.
fn check_titles(merged: &mut Release, primary: &[Source]) {
    let differing = primary
        .iter()
        .any(|(_, release)| !similar_names(&release.title, &merged.title));
    if differing {
        let titles: Vec<String> = primary
            .iter()
            .map(|source| format!("\"{}\" ({})", source.1.title, display_name(source)))
            .collect();
        merged.info.push(
            MessageSeverity::Warning,
            format!("Providers disagree on the title: {}", titles.join(", ")),
        );
    }
}

/// Copy external IDs of matching artists onto the merged credits.
fn align_artists(credits: &mut [ArtistCreditName], candidates: &[ArtistCreditName]) {
    for credit in credits.iter_mut() {
        let Some(candidate) = find_similar(&credit.name, candidates, |c| c.name.as_str()) else {
            continue;
        };
        for id in &candidate.external_ids {
            if !credit.external_ids.contains(id) {
                credit.external_ids.push(id.clone());
            }
        }
        if credit.mbid.is_none() {
            credit.mbid = candidate.mbid.clone();
        }
    }
}

/// Fill missing track data from providers with the same track count.
fn fill_tracks(merged: &mut Release, sources: &[Source]) {
    let count = merged.track_count();
    for (_, release) in sources.iter().skip(1) {
        if release.track_count() != count {
            continue;
        }
        let tracks = merged.media.iter_mut().flat_map(|m| m.tracks.iter_mut());
        for (track, other) in tracks.zip(release.tracks()) {
            if track.isrc.is_none() {
                track.isrc = other.isrc.clone();
            }
            if track.length.is_none() {
                track.length = other.length;
            }
            align_artists(&mut track.artists, &other.artists);
        }
    }
}
