use std::hash::Hash;

use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};

use super::{Container, ContainerKind, SourceMap};

/// Swiss-table hash map.
#[derive(Debug, Default)]
pub struct HashMapContainer<K, V> {
    map: HashMap<K, V>,
}

impl<K: Eq + Hash + Clone, V: Clone> Container<K, V> for HashMapContainer<K, V> {
    const KIND: ContainerKind = ContainerKind::UnorderedHashMap;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    fn from_source(source: &SourceMap<K, V>) -> Self {
        Self { map: source.clone() }
    }

    #[inline]
    fn try_add(&mut self, key: K, value: V) -> bool {
        match self.map.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    #[inline]
    fn try_get_with<R>(&self, key: &K, read: impl FnOnce(&V) -> R) -> Option<R> {
        self.map.get(key).map(read)
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Swiss-table hash set; the stored key doubles as the value.
#[derive(Debug, Default)]
pub struct HashSetContainer<T> {
    set: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Container<T, T> for HashSetContainer<T> {
    const KIND: ContainerKind = ContainerKind::HashSet;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            set: HashSet::with_capacity(capacity),
        }
    }

    fn from_source(source: &SourceMap<T, T>) -> Self {
        Self {
            set: source.keys().cloned().collect(),
        }
    }

    #[inline]
    fn try_add(&mut self, key: T, _value: T) -> bool {
        self.set.insert(key)
    }

    #[inline]
    fn try_get_with<R>(&self, key: &T, read: impl FnOnce(&T) -> R) -> Option<R> {
        self.set.get(key).map(read)
    }

    fn len(&self) -> usize {
        self.set.len()
    }
}
