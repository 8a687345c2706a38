//! Release type guessing from titles.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{MessageSeverity, Release, ReleaseGroupType};

/// Title suffix patterns, each capturing a type name.
static TYPE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "Title (EP)", optionally followed by another parenthetical
        r"(?i)\((EP|Single|Live|Demo)\)(?:\s*\([^)]*\))?\s*$",
        // iTunes style "Title - Single"
        r"(?i)\s-\s(EP|Single|Live)\s*$",
        // bare "Title EP"
        r"(?i)\s(EP)\s*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid type pattern"))
    .collect()
});

/// Collect every type suggested by the title's suffix patterns.
pub fn guess_types_from_title(title: &str) -> BTreeSet<ReleaseGroupType> {
    TYPE_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.captures(title))
        .filter_map(|captures| captures.get(1))
        .filter_map(|m| ReleaseGroupType::from_name(m.as_str()))
        .collect()
}

/// Whether every track is live. An empty tracklist never is.
fn all_tracks_live(release: &Release) -> bool {
    release.track_count() > 0
        && release
            .tracks()
            .all(|track| guess_types_from_title(&track.title).contains(&ReleaseGroupType::Live))
}

/// Union guessed types into the release types.
pub fn guess_release_types(mut release: Release) -> Release {
    let guessed = guess_types_from_title(&release.title);
    let added: Vec<_> = guessed.difference(&release.types).copied().collect();
    release.types.extend(guessed);

    let mut added_names: Vec<String> = added.iter().map(ToString::to_string).collect();
    if !release.types.contains(&ReleaseGroupType::Live) && all_tracks_live(&release) {
        release.types.insert(ReleaseGroupType::Live);
        added_names.push(format!("{} (all tracks)", ReleaseGroupType::Live));
    }

    if !added_names.is_empty() {
        release.info.push(
            MessageSeverity::Debug,
            format!("Guessed release types: {}", added_names.join(", ")),
        );
    }
    release
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Medium, Track};

    fn types(list: &[ReleaseGroupType]) -> BTreeSet<ReleaseGroupType> {
        list.iter().copied().collect()
    }

    fn release_with_tracks(title: &str, tracks: &[&str]) -> Release {
        Release {
            title: title.to_string(),
            media: vec![Medium {
                number: 1,
                tracks: tracks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Track {
                        number: (i + 1).to_string(),
                        title: t.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_parenthesized_types() {
        assert_eq!(guess_types_from_title("Wake of a Nation (EP)"), types(&[ReleaseGroupType::Ep]));
        assert_eq!(guess_types_from_title("One Second (Live)"), types(&[ReleaseGroupType::Live]));
        assert_eq!(
            guess_types_from_title("Song (Single) (Remastered 2020)"),
            types(&[ReleaseGroupType::Single])
        );
        assert_eq!(guess_types_from_title("Rough (demo)"), types(&[ReleaseGroupType::Demo]));
    }

    #[test]
    fn test_itunes_and_bare_suffixes() {
        assert_eq!(guess_types_from_title("Hello - Single"), types(&[ReleaseGroupType::Single]));
        assert_eq!(guess_types_from_title("Spring EP"), types(&[ReleaseGroupType::Ep]));
        // matched by both the iTunes and the bare pattern
        assert_eq!(guess_types_from_title("Spring - EP"), types(&[ReleaseGroupType::Ep]));
        assert!(guess_types_from_title("Epic").is_empty());
        assert!(guess_types_from_title("Live at Wembley").is_empty());
    }

    #[test]
    fn test_existing_types_are_unioned() {
        let mut release = release_with_tracks("Wake of a Nation (EP)", &[]);
        release.types.insert(ReleaseGroupType::Compilation);

        let release = guess_release_types(release);

        assert_eq!(
            release.types,
            types(&[ReleaseGroupType::Ep, ReleaseGroupType::Compilation])
        );
    }

    #[test]
    fn test_live_from_tracks() {
        let release = release_with_tracks(
            "One Second",
            &["One Second - Live", "Darker Thoughts - Live"],
        );

        let release = guess_release_types(release);

        assert_eq!(release.types, types(&[ReleaseGroupType::Live]));
        assert_eq!(release.info.messages.len(), 1);
    }

    #[test]
    fn test_partially_live_is_not_live() {
        let release = release_with_tracks("Mixed", &["Intro", "Song - Live"]);
        assert!(guess_release_types(release).types.is_empty());
    }

    #[test]
    fn test_empty_tracklist_is_never_live() {
        let release = Release {
            title: "Nothing".to_string(),
            media: vec![Medium::empty(1)],
            ..Default::default()
        };
        let release = guess_release_types(release);
        assert!(release.types.is_empty());
        assert!(release.info.messages.is_empty());
    }
}
