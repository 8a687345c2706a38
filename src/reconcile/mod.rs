//! Post-normalization reconciliation passes.
//!
//! Each pass takes a release and returns the updated release, appending its
//! diagnostics to `info.messages`. [`finalize`] composes them in a fixed
//! order so the message list reflects execution order:
//!
//! 1. label cleanup
//! 2. release type guessing
//! 3. script detection
//! 4. language detection
//! 5. copyright normalization
//!
//! Deduplication is applied by the merge step, which is the only place where
//! entities from several providers meet.

pub mod copyright;
pub mod dedupe;
pub mod labels;
pub mod language;
pub mod types;

pub use dedupe::dedupe;
pub use language::{LanguageDetector, WhatlangDetector};

use crate::model::Release;

/// Run all reconciliation passes on a release.
pub fn finalize(release: Release, detector: &dyn LanguageDetector) -> Release {
    let release = labels::cleanup_labels(release);
    let release = types::guess_release_types(release);
    let release = language::detect_script(release);
    let release = language::detect_language(release, detector);
    copyright::normalize_release_copyright(release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, Medium, MessageSeverity, ReleaseGroupType, Track};
    use language::LanguageGuess;

    struct English;

    impl LanguageDetector for English {
        fn guess(&self, _text: &str) -> Vec<LanguageGuess> {
            vec![LanguageGuess {
                code: "eng".to_string(),
                confidence: 0.95,
            }]
        }
    }

    #[test]
    fn test_finalize_runs_all_passes_in_order() {
        let release = Release {
            title: "Night Songs (EP)".to_string(),
            copyright: Some("(p) 2019 Someone".to_string()),
            labels: vec![Label::new("DistroKid")],
            media: vec![Medium {
                number: 1,
                tracks: ["Dawn", "Dusk"]
                    .iter()
                    .map(|t| Track {
                        title: t.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let release = finalize(release, &English);

        assert_eq!(release.labels[0].name, labels::NO_LABEL_NAME);
        assert!(release.types.contains(&ReleaseGroupType::Ep));
        assert_eq!(release.script.as_ref().unwrap().code, "Latn");
        assert_eq!(release.language.as_ref().unwrap().code, "eng");
        assert_eq!(release.copyright.as_deref(), Some("℗ 2019 Someone"));

        let texts: Vec<_> = release.info.messages.iter().map(|m| m.text.as_str()).collect();
        assert!(texts[0].contains("placeholder label"));
        assert!(texts[1].contains("release types"));
        assert!(texts[2].contains("language"));
        assert!(release.info.messages.iter().all(|m| m.severity == MessageSeverity::Debug));
    }
}
