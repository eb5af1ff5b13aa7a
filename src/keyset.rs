//! Insertion-ordered map from poster IDs to the thread keys they posted in.
//!
//! The Jaccard metric indexes its distance matrix by this map's iteration
//! order, so the order must be stable and authoritative: first insertion
//! wins the position, later inserts for the same ID replace the key set
//! in place.

use std::collections::{HashMap, HashSet};

use crate::ident::{PosterId, ThreadKey};

/// Poster ID → set of thread keys, preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct KeysetMap {
    entries: Vec<(PosterId, HashSet<ThreadKey>)>,
    index: HashMap<PosterId, usize>,
}

impl KeysetMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the key set for `id`.
    ///
    /// A replacement keeps the ID's original position.
    pub fn insert(&mut self, id: PosterId, keys: impl IntoIterator<Item = ThreadKey>) {
        let keys: HashSet<ThreadKey> = keys.into_iter().collect();
        match self.index.get(&id) {
            Some(&pos) => self.entries[pos].1 = keys,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, keys));
            }
        }
    }

    /// Key set for one poster, if present.
    pub fn get(&self, id: &PosterId) -> Option<&HashSet<ThreadKey>> {
        self.index.get(id).map(|&pos| &self.entries[pos].1)
    }

    /// Poster IDs in insertion order — the authoritative matrix index order.
    pub fn posters(&self) -> Vec<PosterId> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&PosterId, &HashSet<ThreadKey>)> {
        self.entries.iter().map(|(id, keys)| (id, keys))
    }

    /// Number of posters in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no posters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PosterId, Vec<ThreadKey>)> for KeysetMap {
    fn from_iter<I: IntoIterator<Item = (PosterId, Vec<ThreadKey>)>>(iter: I) -> Self {
        let mut map = KeysetMap::new();
        for (id, keys) in iter {
            map.insert(id, keys);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut map = KeysetMap::new();
        map.insert("zeta".into(), vec![ThreadKey::new("1")]);
        map.insert("alpha".into(), vec![ThreadKey::new("2")]);
        map.insert("mid".into(), vec![]);

        let order: Vec<String> = map.posters().iter().map(|p| p.as_str().into()).collect();
        assert_eq!(order, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn replacement_keeps_position() {
        let mut map = KeysetMap::new();
        map.insert("a".into(), vec![ThreadKey::new("1")]);
        map.insert("b".into(), vec![ThreadKey::new("2")]);
        map.insert("a".into(), vec![ThreadKey::new("3"), ThreadKey::new("4")]);

        let order: Vec<String> = map.posters().iter().map(|p| p.as_str().into()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(map.get(&"a".into()).unwrap().len(), 2);
    }

    #[test]
    fn duplicate_keys_collapse_into_set() {
        let mut map = KeysetMap::new();
        map.insert(
            "a".into(),
            vec![ThreadKey::new("1"), ThreadKey::new("1"), ThreadKey::new("2")],
        );
        assert_eq!(map.get(&"a".into()).unwrap().len(), 2);
    }
}
