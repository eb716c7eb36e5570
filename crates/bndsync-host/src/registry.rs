use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Items stored in a [`KeyedTable`] carry their own key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Name-keyed registry preserving insertion order.
///
/// Lookups are by the deterministic identity string the importer synthesizes
/// (`bnd:<bsn>:<version>`, a module name, ...), so "find or create" never
/// produces two entries for the same identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyedTable<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for KeyedTable<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: Keyed> KeyedTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry for `key`, creating it with `create` when missing.
    pub fn find_or_insert_with(&mut self, key: &str, create: impl FnOnce() -> T) -> &mut T {
        self.entries.entry(key.to_string()).or_insert_with(create)
    }

    /// Insert or replace, keeping the original position of a replaced entry.
    pub fn insert(&mut self, item: T) -> Option<T> {
        self.entries.insert(item.key().to_string(), item)
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
