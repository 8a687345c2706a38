//! Mapping of request URLs to snapshot storage paths.
//!
//! `https://itunes.apple.com/lookup?upc=123&country=GB` becomes
//! `com.apple.itunes/lookup/!upc=123&country=GB`:
//!
//! - the host is reversed into label order so related hosts sort together
//! - every path segment and the query are percent-decoded
//! - characters that are illegal in file names become [`MARKER`]
//! - overlong segments are cut and suffixed with a short hash

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use url::Url;

/// Replacement for characters that cannot appear in file names.
pub const MARKER: char = '!';

/// Number of hex digits of the hash suffix of truncated segments.
const HASH_LENGTH: usize = 8;

/// Options for [`snapshot_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// Maximum segment length in bytes
    pub max_segment_length: usize,
    /// Map `/a/` and `/a` to different paths
    pub strict_trailing_slash: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            max_segment_length: 100,
            strict_trailing_slash: false,
        }
    }
}

/// Compute the relative storage path of `url`.
pub fn snapshot_path(url: &Url, options: &PathOptions) -> PathBuf {
    let mut path = PathBuf::new();
    path.push(limit_segment(host_segment(url), options));

    let raw_path = url.path();
    for segment in raw_path.split('/').filter(|s| !s.is_empty()) {
        path.push(limit_segment(sanitize_segment(&decode(segment)), options));
    }

    if options.strict_trailing_slash && raw_path.len() > 1 && raw_path.ends_with('/') {
        path.push(format!("{}index", MARKER));
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        let segment = sanitize_segment(&format!("?{}", decode(query)));
        path.push(limit_segment(segment, options));
    }

    path
}

/// Reversed host labels, with the port appended if there is one.
fn host_segment(url: &Url) -> String {
    let host = url.host_str().unwrap_or("localhost");
    let mut labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    labels.reverse();
    let mut segment = sanitize_segment(&labels.join("."));
    if let Some(port) = url.port() {
        segment.push(MARKER);
        segment.push_str(&port.to_string());
    }
    segment
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Replace characters that are illegal in file names on common platforms.
pub fn sanitize_segment(segment: &str) -> String {
    if segment == "." || segment == ".." {
        return segment.replace('.', &MARKER.to_string());
    }
    segment
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => MARKER,
            c if c.is_control() => MARKER,
            c => c,
        })
        .collect()
}

/// Truncate a segment to the configured length, keeping it unique.
fn limit_segment(segment: String, options: &PathOptions) -> String {
    let max = options.max_segment_length.max(HASH_LENGTH + 2);
    if segment.len() <= max {
        return segment;
    }

    let digest = Sha256::digest(segment.as_bytes());
    let hash = format!("{:x}", digest);
    let budget = max - HASH_LENGTH - MARKER.len_utf8();

    let mut cut = budget;
    while !segment.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}{}", &segment[..cut], MARKER, &hash[..HASH_LENGTH])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(url: &str) -> String {
        snapshot_path(&Url::parse(url).unwrap(), &PathOptions::default())
            .to_string_lossy()
            .replace('\\', "/")
    }

    #[test]
    fn test_host_is_reversed() {
        assert_eq!(path_of("https://itunes.apple.com/lookup"), "com.apple.itunes/lookup");
    }

    #[test]
    fn test_query_becomes_segment() {
        assert_eq!(
            path_of("https://itunes.apple.com/lookup?upc=123&country=GB"),
            "com.apple.itunes/lookup/!upc=123&country=GB"
        );
    }

    #[test]
    fn test_segments_are_decoded_and_sanitized() {
        assert_eq!(
            path_of("https://api.example.com/search/a%3Ab%20c?q=x%2Fy"),
            "com.example.api/search/a!b c/!q=x!y"
        );
    }

    #[test]
    fn test_port_is_kept() {
        assert_eq!(path_of("http://localhost:8080/a"), "localhost!8080/a");
    }

    #[test]
    fn test_trailing_slash_is_ignored_by_default() {
        assert_eq!(path_of("https://example.com/albums/"), path_of("https://example.com/albums"));
    }

    #[test]
    fn test_strict_trailing_slash() {
        let options = PathOptions {
            strict_trailing_slash: true,
            ..Default::default()
        };
        let dir = snapshot_path(&Url::parse("https://example.com/albums/").unwrap(), &options);
        let file = snapshot_path(&Url::parse("https://example.com/albums").unwrap(), &options);
        assert_ne!(dir, file);
        assert!(dir.ends_with("!index"));
    }

    #[test]
    fn test_dot_segments_cannot_escape() {
        assert_eq!(sanitize_segment(".."), "!!");
        assert_eq!(sanitize_segment("."), "!");
    }

    #[test]
    fn test_long_segments_are_truncated_uniquely() {
        let options = PathOptions {
            max_segment_length: 20,
            ..Default::default()
        };
        let a = limit_segment("x".repeat(50), &options);
        let b = limit_segment(format!("{}y", "x".repeat(49)), &options);
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
        assert!(a.starts_with("xxxxxxxxxxx!"));
    }
}
