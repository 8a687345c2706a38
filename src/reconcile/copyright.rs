//! Copyright and phonographic copyright symbol normalization.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Release;

pub const COPYRIGHT: char = '©';
pub const PHONOGRAM: char = '℗';

static COPYRIGHT_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(c\)").expect("valid copyright regex"));
static PHONOGRAM_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(p\)").expect("valid phonogram regex"));

/// Replace the first `(c)` and `(p)` markers with their symbols.
///
/// When `expected` is given and the text carries no symbol at all, it is
/// prepended.
pub fn normalize_copyright(text: &str, expected: Option<char>) -> String {
    let replaced = COPYRIGHT_TEXT.replace(text, COPYRIGHT.to_string());
    let replaced = PHONOGRAM_TEXT.replace(&replaced, PHONOGRAM.to_string());
    let mut result = replaced.into_owned();

    if let Some(symbol) = expected
        && !result.contains(COPYRIGHT)
        && !result.contains(PHONOGRAM)
    {
        result = format!("{} {}", symbol, result);
    }
    result
}

/// Normalize the release copyright in place.
pub fn normalize_release_copyright(mut release: Release) -> Release {
    if let Some(copyright) = release.copyright.take() {
        release.copyright = Some(normalize_copyright(copyright.trim(), None));
    }
    release
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_markers() {
        assert_eq!(normalize_copyright("(P) 2016 X", None), "℗ 2016 X");
        assert_eq!(normalize_copyright("(p)(c) 2017 X", None), "℗© 2017 X");
    }

    #[test]
    fn test_only_first_occurrence_replaced() {
        assert_eq!(normalize_copyright("(c) 2001 (c) 2002", None), "© 2001 (c) 2002");
    }

    #[test]
    fn test_prepends_expected_symbol() {
        assert_eq!(normalize_copyright("2016 Label", Some(PHONOGRAM)), "℗ 2016 Label");
    }

    #[test]
    fn test_no_duplicate_prepend() {
        assert_eq!(normalize_copyright("(c)+(p) X", Some(PHONOGRAM)), "©+℗ X");
        assert_eq!(normalize_copyright("© 2020 Y", Some(PHONOGRAM)), "© 2020 Y");
    }

    #[test]
    fn test_release_pass() {
        let release = Release {
            copyright: Some(" (c) 1999 Label ".to_string()),
            ..Default::default()
        };
        let release = normalize_release_copyright(release);
        assert_eq!(release.copyright.as_deref(), Some("© 1999 Label"));
    }
}
