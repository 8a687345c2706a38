//! Deduplication of resolvable entities.

use std::collections::HashSet;

use crate::model::Resolvable;

#[derive(Debug, PartialEq, Eq, Hash)]
enum Identity {
    Mbid(String),
    Name(String),
}

fn identity<T: Resolvable>(entity: &T) -> Option<Identity> {
    match (entity.mbid(), entity.name()) {
        (Some(mbid), _) => Some(Identity::Mbid(mbid.to_string())),
        (None, Some(name)) => Some(Identity::Name(name.to_string())),
        (None, None) => None,
    }
}

/// Keep the first entity per identity, preserving order of first appearance.
///
/// Entities with neither a database ID nor a name are dropped.
pub fn dedupe<T: Resolvable>(entities: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .filter(|entity| match identity(entity) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::model::Label;
    use proptest::prelude::*;

    fn label() -> impl Strategy<Value = Label> {
        (prop::option::of("[ab]"), "[xyz]{0,1}").prop_map(|(mbid, name)| Label {
            name,
            mbid,
            ..Default::default()
        })
    }

    proptest! {
        /// Output never contains two entities with the same identity
        #[test]
        fn output_identities_are_unique(labels in prop::collection::vec(label(), 0..20)) {
            let result = dedupe(labels);
            let mut keys = HashSet::new();
            for entity in &result {
                let key = identity(entity);
                prop_assert!(key.is_some());
                prop_assert!(keys.insert(key));
            }
        }

        /// Output is a subsequence of the input
        #[test]
        fn output_preserves_order(labels in prop::collection::vec(label(), 0..20)) {
            let result = dedupe(labels.clone());
            let mut remaining = labels.iter();
            for entity in &result {
                prop_assert!(remaining.any(|candidate| candidate == entity));
            }
        }
    }
}
