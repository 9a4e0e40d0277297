//! Persistent (structurally shared) maps from `rpds`.
//!
//! Insertion uses `insert_mut`, which updates in place when the root is not
//! shared and path-copies otherwise. Snapshots taken with `clone` are never
//! affected by later insertions.

use std::hash::Hash;

use rpds::{HashTrieMap, RedBlackTreeMap};

use super::{Container, ContainerKind, SourceMap};

/// Hash array mapped trie. The capacity hint is ignored.
pub struct PersistentHashMap<K, V> {
    map: HashTrieMap<K, V>,
}

impl<K: Eq + Hash, V> PersistentHashMap<K, V> {
    pub fn snapshot(&self) -> HashTrieMap<K, V> {
        self.map.clone()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Container<K, V> for PersistentHashMap<K, V> {
    const KIND: ContainerKind = ContainerKind::PersistentHashMap;

    fn with_capacity(_capacity: usize) -> Self {
        Self {
            map: HashTrieMap::new(),
        }
    }

    fn from_source(source: &SourceMap<K, V>) -> Self {
        Self {
            map: source.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    #[inline]
    fn try_add(&mut self, key: K, value: V) -> bool {
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert_mut(key, value);
        true
    }

    #[inline]
    fn try_get_with<R>(&self, key: &K, read: impl FnOnce(&V) -> R) -> Option<R> {
        self.map.get(key).map(read)
    }

    fn len(&self) -> usize {
        self.map.size()
    }
}

/// Persistent red-black tree. The capacity hint is ignored.
pub struct PersistentOrderedMap<K, V> {
    map: RedBlackTreeMap<K, V>,
}

impl<K: Ord + Clone, V: Clone> Container<K, V> for PersistentOrderedMap<K, V> {
    const KIND: ContainerKind = ContainerKind::PersistentOrderedMap;

    fn with_capacity(_capacity: usize) -> Self {
        Self {
            map: RedBlackTreeMap::new(),
        }
    }

    fn from_source(source: &SourceMap<K, V>) -> Self {
        Self {
            map: source.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    #[inline]
    fn try_add(&mut self, key: K, value: V) -> bool {
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert_mut(key, value);
        true
    }

    #[inline]
    fn try_get_with<R>(&self, key: &K, read: impl FnOnce(&V) -> R) -> Option<R> {
        self.map.get(key).map(read)
    }

    fn len(&self) -> usize {
        self.map.size()
    }
}
