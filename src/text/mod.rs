//! Text heuristics shared by providers and the reconciliation passes.
//!
//! - `similarity` - name simplification for cross-provider matching
//! - `script` - per-character writing system classification
//! - `gtin` - barcode validation and zero-padding equivalence

pub mod gtin;
pub mod script;
pub mod similarity;

pub use similarity::{find_similar, similar_names, simplify_name};
