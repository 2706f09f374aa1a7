//! Buffered writes over a read-only store.
//!
//! A computation that must not touch the caller's store until it has fully
//! succeeded writes into a `StateOverlay`. Reads see the overlay first and
//! fall through to the base store. On success the overlay becomes a sorted,
//! one-entry-per-key mutation list; on failure it is dropped.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::execution::Mutation;
use crate::store::KvStore;

/// Write buffer overlaying a base store.
#[derive(Debug, Clone, Default)]
pub struct StateOverlay {
    /// key → Some(value) for sets, key → None for deletions.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// Total bytes written (keys + values), for enforcing write limits.
    total_write_bytes: u64,
}

/// Result of looking up a key in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayResult {
    /// Key was set in the overlay to this value.
    Found(Vec<u8>),
    /// Key was deleted in the overlay.
    Deleted,
    /// Key is untouched; the caller must consult the base store.
    NotInOverlay,
}

impl StateOverlay {
    /// Create a new empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing any earlier set or delete of the same key.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.forget_previous(&key);
        self.total_write_bytes = self
            .total_write_bytes
            .saturating_add((key.len() + value.len()) as u64);
        self.writes.insert(key, Some(value));
    }

    /// Record a deletion. Later reads return `Deleted` instead of falling through.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.forget_previous(&key);
        self.total_write_bytes = self.total_write_bytes.saturating_add(key.len() as u64);
        self.writes.insert(key, None);
    }

    fn forget_previous(&mut self, key: &[u8]) {
        if let Some(prev) = self.writes.get(key) {
            let prev_bytes = key.len() as u64 + prev.as_ref().map_or(0, |v| v.len() as u64);
            self.total_write_bytes = self.total_write_bytes.saturating_sub(prev_bytes);
        }
    }

    /// Look up a key in the overlay only.
    pub fn get(&self, key: &[u8]) -> OverlayResult {
        match self.writes.get(key) {
            Some(Some(value)) => OverlayResult::Found(value.clone()),
            Some(None) => OverlayResult::Deleted,
            None => OverlayResult::NotInOverlay,
        }
    }

    /// Read a key as seen through the overlay: overlay first, then `base`.
    pub fn read_through(
        &self,
        key: &[u8],
        base: &dyn KvStore,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        match self.get(key) {
            OverlayResult::Found(value) => Ok(Some(value)),
            OverlayResult::Deleted => Ok(None),
            OverlayResult::NotInOverlay => base.get(key),
        }
    }

    /// Returns true if the overlay holds a set or delete for this key.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.writes.contains_key(key)
    }

    /// Consume the overlay into a mutation list sorted by key.
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => Mutation::Set { key, value },
                None => Mutation::Delete { key },
            })
            .collect()
    }

    /// Discard all buffered writes.
    pub fn clear(&mut self) {
        self.writes.clear();
        self.total_write_bytes = 0;
    }

    /// Returns the number of keys touched.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if no writes have been buffered.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Returns the total bytes written (keys + values).
    pub fn total_write_bytes(&self) -> u64 {
        self.total_write_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[test]
    fn test_overlay_set_and_get() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"key1".to_vec(), b"value1".to_vec());
        assert_eq!(overlay.get(b"key1"), OverlayResult::Found(b"value1".to_vec()));
        assert_eq!(overlay.get(b"other"), OverlayResult::NotInOverlay);
    }

    #[test]
    fn test_read_through_prefers_overlay() {
        let mut base = MemStore::new();
        base.insert(b"a".to_vec(), b"base".to_vec());
        base.insert(b"b".to_vec(), b"base".to_vec());

        let mut overlay = StateOverlay::new();
        overlay.set(b"a".to_vec(), b"new".to_vec());
        overlay.delete(b"b".to_vec());

        assert_eq!(overlay.read_through(b"a", &base).unwrap(), Some(b"new".to_vec()));
        assert_eq!(overlay.read_through(b"b", &base).unwrap(), None);
        assert_eq!(overlay.read_through(b"c", &base).unwrap(), None);
        // base is untouched
        assert_eq!(base.get(b"b").unwrap(), Some(b"base".to_vec()));
    }

    #[test]
    fn test_delete_then_set() {
        let mut overlay = StateOverlay::new();
        overlay.delete(b"key1".to_vec());
        overlay.set(b"key1".to_vec(), b"new_value".to_vec());
        assert_eq!(overlay.get(b"key1"), OverlayResult::Found(b"new_value".to_vec()));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn test_into_mutations_sorted_one_per_key() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"c".to_vec(), b"3".to_vec());
        overlay.set(b"a".to_vec(), b"1".to_vec());
        overlay.set(b"a".to_vec(), b"2".to_vec());
        overlay.delete(b"b".to_vec());

        let mutations = overlay.into_mutations();
        assert_eq!(
            mutations,
            vec![
                Mutation::Set { key: b"a".to_vec(), value: b"2".to_vec() },
                Mutation::Delete { key: b"b".to_vec() },
                Mutation::Set { key: b"c".to_vec(), value: b"3".to_vec() },
            ]
        );
    }

    #[test]
    fn test_total_write_bytes_tracks_overwrites() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"key1".to_vec(), b"value1".to_vec());
        assert_eq!(overlay.total_write_bytes(), 10);

        overlay.set(b"key2".to_vec(), b"val2".to_vec());
        assert_eq!(overlay.total_write_bytes(), 18);

        overlay.set(b"key1".to_vec(), b"v".to_vec());
        assert_eq!(overlay.total_write_bytes(), 13);

        overlay.clear();
        assert!(overlay.is_empty());
        assert_eq!(overlay.total_write_bytes(), 0);
    }
}
