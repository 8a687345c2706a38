//! Writing system classification.
//!
//! Characters are mapped to ISO 15924 codes by Unicode block. Digits,
//! punctuation and whitespace are not classified and do not count towards
//! frequencies.

use std::collections::HashMap;

/// Share of classified characters written in one script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFrequency {
    pub code: &'static str,
    pub count: usize,
    pub frequency: f64,
}

/// Classify a single character.
pub fn classify_char(c: char) -> Option<&'static str> {
    if !c.is_alphabetic() {
        return None;
    }
    let code = match c as u32 {
        0x0041..=0x024F | 0x1E00..=0x1EFF | 0x2C60..=0x2C7F | 0xA720..=0xA7FF => "Latn",
        0x0370..=0x03FF | 0x1F00..=0x1FFF => "Grek",
        0x0400..=0x052F | 0x2DE0..=0x2DFF | 0xA640..=0xA69F => "Cyrl",
        0x0530..=0x058F => "Armn",
        0x0590..=0x05FF => "Hebr",
        0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF => "Arab",
        0x0900..=0x097F => "Deva",
        0x0980..=0x09FF => "Beng",
        0x0E00..=0x0E7F => "Thai",
        0x10A0..=0x10FF => "Geor",
        0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => "Hang",
        0x3040..=0x309F => "Hira",
        0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => "Kana",
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => "Hani",
        _ => return None,
    };
    Some(code)
}

/// Count scripts in `text`, most frequent first.
///
/// Text containing kana reports Hiragana, Katakana and Han together as
/// Japanese (`Jpan`).
pub fn script_frequencies(text: &str) -> Vec<ScriptFrequency> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for code in text.chars().filter_map(classify_char) {
        *counts.entry(code).or_default() += 1;
    }

    if counts.contains_key("Hira") || counts.contains_key("Kana") {
        let japanese: usize = ["Hira", "Kana", "Hani"]
            .iter()
            .filter_map(|code| counts.remove(code))
            .sum();
        counts.insert("Jpan", japanese);
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut frequencies: Vec<_> = counts
        .into_iter()
        .map(|(code, count)| ScriptFrequency {
            code,
            count,
            frequency: count as f64 / total as f64,
        })
        .collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then(a.code.cmp(b.code)));
    frequencies
}
