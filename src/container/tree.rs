use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::{Container, ContainerKind, SourceMap};

/// Balanced-tree ordered map. The capacity hint is ignored.
#[derive(Debug, Default)]
pub struct TreeMap<K, V> {
    map: BTreeMap<K, V>,
}

impl<K: Ord + Clone, V: Clone> Container<K, V> for TreeMap<K, V> {
    const KIND: ContainerKind = ContainerKind::TreeMap;

    fn with_capacity(_capacity: usize) -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    fn from_source(source: &SourceMap<K, V>) -> Self {
        Self {
            map: source.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
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
