//! Name similarity for aligning entities across providers.
//!
//! Two names are similar when their simplified forms are identical. There is
//! no partial scoring: "J. Doe" and "Jane Doe" are different names.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// A single letter followed by a dot, as in "J.A.N.E."
static ABBREVIATION_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\w)\.").expect("valid abbreviation regex"));

/// Simplify a name for comparison.
///
/// Case-folds, strips accents, removes abbreviation dots and turns any
/// punctuation (hyphens included) into single spaces.
pub fn simplify_name(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let without_dots = ABBREVIATION_DOT.replace_all(&stripped, "$1");

    without_dots
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two names refer to the same entity.
pub fn similar_names(a: &str, b: &str) -> bool {
    simplify_name(a) == simplify_name(b)
}

/// Find the first candidate whose name is similar to `name`.
pub fn find_similar<'a, T, F>(name: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let wanted = simplify_name(name);
    candidates
        .iter()
        .find(|candidate| simplify_name(name_of(candidate)) == wanted)
}
