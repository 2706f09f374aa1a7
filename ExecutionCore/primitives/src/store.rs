//! Key-value store abstraction and its in-memory implementation.
//!
//! `KvStore` is the state every computation reads and mutates. An absent key
//! reads as `Ok(None)`, which computations treat as the empty value rather
//! than an error.
//!
//! A store is owned by the caller that created it. Remote backends never
//! hold a reference to it, only copies of the values they ship.

use std::collections::BTreeMap;

use crate::error::StoreError;

/// Mutable key-value state handed to an execution backend.
pub trait KvStore {
    /// Get the value for a key. Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Set a key to a value, replacing any previous value.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;
}

/// In-memory store backed by `BTreeMap`.
///
/// BTreeMap gives deterministic iteration order, so two stores built from the
/// same writes compare equal and print identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Create a store pre-populated with data.
    pub fn with_data(data: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self { data }
    }

    /// Insert a key-value pair into the store.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.data.insert(key, value);
    }

    /// Remove a key from the store.
    pub fn remove(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    /// Borrow every entry, sorted by key.
    pub fn entries(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.data
    }

    /// Returns the number of entries in the store.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = MemStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut store = MemStore::new();
        store.set(b"key1", b"value1").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let mut store = MemStore::new();
        store.set(b"key1", b"v1").unwrap();
        store.set(b"key1", b"v2").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_absent_key_is_ok() {
        let mut store = MemStore::new();
        store.delete(b"never-set").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete() {
        let mut store = MemStore::new();
        store.insert(b"key1".to_vec(), b"value1".to_vec());
        store.delete(b"key1").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_with_data_and_equality() {
        let mut data = BTreeMap::new();
        data.insert(b"a".to_vec(), b"1".to_vec());
        data.insert(b"b".to_vec(), b"2".to_vec());

        let store = MemStore::with_data(data);
        let mut other = MemStore::new();
        other.set(b"b", b"2").unwrap();
        other.set(b"a", b"1").unwrap();
        assert_eq!(store, other);
    }

    #[test]
    fn test_empty_value_is_distinct_from_absent() {
        let mut store = MemStore::new();
        store.set(b"empty_val", b"").unwrap();
        assert_eq!(store.get(b"empty_val").unwrap(), Some(vec![]));
        assert_eq!(store.get(b"other").unwrap(), None);
    }
}
