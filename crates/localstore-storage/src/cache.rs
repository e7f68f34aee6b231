//! In-memory key-value cache with its volatile-key set.
//!
//! The volatile set is always a subset of the cached keys: removing or
//! clearing entries removes them from both.

use std::collections::{BTreeMap, HashMap, HashSet};

use localstore_types::Value;

/// Key-value entries plus the keys excluded from persistence.
#[derive(Clone, Debug, Default)]
pub struct Cache {
    entries: HashMap<String, Value>,
    volatile: HashSet<String>,
}

impl Cache {
    /// Builds a cache from decoded entries; nothing is volatile.
    pub fn from_entries(entries: HashMap<String, Value>) -> Self {
        Self {
            entries,
            volatile: HashSet::new(),
        }
    }

    /// Inserts or overwrites a persistent entry. A key previously marked
    /// volatile becomes persistent again.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.volatile.remove(key);
        self.entries.insert(key.to_owned(), value);
    }

    /// Inserts or overwrites an entry that the next snapshot will skip.
    pub fn insert_volatile(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_owned(), value);
        self.volatile.insert(key.to_owned());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_volatile(&self, key: &str) -> bool {
        self.volatile.contains(key)
    }

    /// Removes an entry and its volatile mark. Returns the old value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.volatile.remove(key);
        self.entries.remove(key)
    }

    /// Empties entries and the volatile set.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.volatile.clear();
    }

    /// Makes every current entry persistent.
    pub fn clear_volatile(&mut self) {
        self.volatile.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All entries, ordered by key.
    pub fn entries(&self) -> BTreeMap<&str, &Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// The non-volatile subset, ordered by key. This is exactly what a
    /// save writes.
    pub fn snapshot(&self) -> BTreeMap<&str, &Value> {
        self.entries
            .iter()
            .filter(|(k, _)| !self.volatile.contains(k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    #[cfg(test)]
    fn volatile_is_subset(&self) -> bool {
        self.volatile.iter().all(|k| self.entries.contains_key(k))
    }
}
