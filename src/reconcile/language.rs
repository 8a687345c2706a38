//! Language and script detection from release and track titles.

use crate::model::{Language, MessageSeverity, Release, Script};
use crate::text::script::script_frequencies;

/// Minimum share of classified characters for a script to be accepted.
pub const SCRIPT_THRESHOLD: f64 = 0.7;

/// Minimum confidence for a language guess to be accepted.
pub const LANGUAGE_THRESHOLD: f64 = 0.8;

/// Candidates above this confidence are listed in the diagnostics.
pub const CANDIDATE_THRESHOLD: f64 = 0.1;

/// A candidate language with its confidence in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageGuess {
    /// ISO 639-3 code
    pub code: String,
    pub confidence: f64,
}

/// Guesses the language of a text.
pub trait LanguageDetector: Send + Sync {
    /// Return candidates, most confident first.
    fn guess(&self, text: &str) -> Vec<LanguageGuess>;
}

/// Detector backed by the `whatlang` trigram models.
///
/// `whatlang` only reports its best guess, so the candidate list holds at
/// most one language.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn guess(&self, text: &str) -> Vec<LanguageGuess> {
        whatlang::detect(text)
            .map(|info| LanguageGuess {
                code: info.lang().code().to_string(),
                confidence: info.confidence(),
            })
            .into_iter()
            .collect()
    }
}

/// Detect the script if the release has none.
pub fn detect_script(mut release: Release) -> Release {
    if release.script.is_some() {
        return release;
    }

    let text = release.all_titles().join("\n");
    let frequencies = script_frequencies(&text);

    match frequencies.first() {
        Some(top) if top.frequency > SCRIPT_THRESHOLD => {
            release.script = Some(Script {
                code: top.code.to_string(),
                frequency: Some(top.frequency),
            });
        }
        Some(_) => {
            let summary: Vec<String> = frequencies
                .iter()
                .map(|f| format!("{} ({:.0}%)", f.code, f.frequency * 100.0))
                .collect();
            release.info.push(
                MessageSeverity::Warning,
                format!("Titles are written in multiple scripts: {}", summary.join(", ")),
            );
        }
        None => {
            release.info.push(
                MessageSeverity::Warning,
                "Unable to detect the script of the titles",
            );
        }
    }
    release
}

/// Guess the language if the release has none.
///
/// Releases with one or two tracks do not have enough text for a reliable
/// guess and are skipped.
pub fn detect_language(mut release: Release, detector: &dyn LanguageDetector) -> Release {
    if release.language.is_some() {
        return release;
    }

    let titles = release.all_titles();
    if titles.len() <= 2 {
        return release;
    }

    let guesses = detector.guess(&titles.join("\n"));
    let candidates: Vec<String> = guesses
        .iter()
        .filter(|guess| guess.confidence > CANDIDATE_THRESHOLD)
        .map(|guess| format!("{} ({:.0}%)", guess.code, guess.confidence * 100.0))
        .collect();
    if !candidates.is_empty() {
        release.info.push(
            MessageSeverity::Debug,
            format!("Guessed language of the titles: {}", candidates.join(", ")),
        );
    }

    if let Some(top) = guesses.first()
        && top.confidence > LANGUAGE_THRESHOLD
    {
        release.language = Some(Language {
            code: top.code.clone(),
            confidence: Some(top.confidence),
        });
    }
    release
}
