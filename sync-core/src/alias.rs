//! Name→id index for alias lookups.
//!
//! Callers may refer to entities by a human-readable name. The index is
//! built lazily from a full listing the first time an alias misses, then
//! reused until cleared.

use feedsync_types::{normalize_alias, Entity, EntityId};
use std::collections::HashMap;

/// Lowercased-name → id index.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<String, EntityId>,
}

impl NameIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an alias. The name is normalized before lookup.
    pub fn resolve(&self, name: &str) -> Option<EntityId> {
        self.names.get(&normalize_alias(name)).copied()
    }

    /// Index a single entity under its alias, if it has one.
    pub fn insert<E: Entity>(&mut self, entity: &E) {
        if let Some(alias) = entity.alias() {
            let key = normalize_alias(alias);
            if !key.is_empty() {
                self.names.insert(key, entity.id());
            }
        }
    }

    /// Index every entity of a full listing.
    pub fn rebuild_from<'a, E, I>(&mut self, entities: I)
    where
        E: Entity,
        I: IntoIterator<Item = &'a E>,
    {
        for entity in entities {
            self.insert(entity);
        }
    }

    /// Number of indexed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check whether the index has no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drop all names.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_types::Group;

    fn group(id: u64, name: &str, slug: Option<&str>) -> Group {
        Group {
            id: EntityId::new(id),
            name: name.into(),
            slug: slug.map(String::from),
            description: None,
            member_count: 0,
            full_detail: false,
        }
    }

    #[test]
    fn starts_empty() {
        let index = NameIndex::new();
        assert!(index.is_empty());
        assert!(index.resolve("anything").is_none());
    }

    #[test]
    fn resolves_case_insensitively() {
        let mut index = NameIndex::new();
        index.insert(&group(1, "Climbing Club", None));

        assert_eq!(index.resolve("climbing club"), Some(EntityId::new(1)));
        assert_eq!(index.resolve("  CLIMBING CLUB "), Some(EntityId::new(1)));
    }

    #[test]
    fn rebuild_indexes_listing() {
        let groups = vec![group(1, "A", Some("alpha")), group(2, "B", Some("beta"))];
        let mut index = NameIndex::new();
        index.rebuild_from(&groups);

        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve("beta"), Some(EntityId::new(2)));
        // Slug wins over the display name
        assert!(index.resolve("b").is_none());
    }

    #[test]
    fn later_entries_overwrite_earlier_ones() {
        let mut index = NameIndex::new();
        index.insert(&group(1, "dup", None));
        index.insert(&group(2, "DUP", None));
        assert_eq!(index.resolve("dup"), Some(EntityId::new(2)));
    }

    #[test]
    fn clear_drops_all_names() {
        let mut index = NameIndex::new();
        index.rebuild_from(&[group(1, "a", None)]);
        index.clear();
        assert!(index.resolve("a").is_none());
        assert!(index.is_empty());
    }
}
