//! Distributor placeholder label cleanup.
//!
//! Self-publishing distributors fill in their own name (or a numeric
//! placeholder) when an artist does not provide a label. Such labels have no
//! real-world identity and are replaced by the "[no label]" entity.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Label, MessageSeverity, Release};

/// Name of the special "no label" entity.
pub const NO_LABEL_NAME: &str = "[no label]";

/// Database ID of the special "no label" entity.
pub const NO_LABEL_MBID: &str = "157afde4-4bf5-4039-8ad2-5a15acc85176";

static DISTRIBUTOR_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:distro\s*kid(?:\.com)?|\d+\s+records\s+dk\d?)\s*$")
        .expect("valid placeholder regex")
});

/// Whether `name` is a distributor placeholder rather than a real label.
pub fn is_placeholder_label(name: &str) -> bool {
    DISTRIBUTOR_PLACEHOLDER.is_match(name)
}

/// Replace a placeholder label by "[no label]", keeping its catalog number.
pub fn cleanup_label(label: Label) -> Label {
    if !is_placeholder_label(&label.name) {
        return label;
    }
    Label {
        name: NO_LABEL_NAME.to_string(),
        mbid: Some(NO_LABEL_MBID.to_string()),
        catalog_number: label.catalog_number,
        external_ids: Vec::new(),
    }
}

/// Clean up all labels of a release.
pub fn cleanup_labels(mut release: Release) -> Release {
    let labels = std::mem::take(&mut release.labels);
    for label in labels {
        if is_placeholder_label(&label.name) {
            release.info.push(
                MessageSeverity::Debug,
                format!("Replaced distributor placeholder label \"{}\"", label.name),
            );
        }
        release.labels.push(cleanup_label(label));
    }
    release
}
