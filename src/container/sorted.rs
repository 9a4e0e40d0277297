use super::{Container, ContainerKind, SourceMap};

/// Map backed by a vector of entries kept sorted by key.
///
/// Lookups are a binary search; insertion shifts the tail, so try-add is
/// linear in the number of stored entries.
#[derive(Debug, Default)]
pub struct SortedVecMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: Ord, V> SortedVecMap<K, V> {
    #[inline]
    fn search(&self, key: &K) -> Result<usize, usize> {
        self.entries.binary_search_by(|(probe, _)| probe.cmp(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: Ord + Clone, V: Clone> Container<K, V> for SortedVecMap<K, V> {
    const KIND: ContainerKind = ContainerKind::SortedVecMap;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn from_source(source: &SourceMap<K, V>) -> Self {
        let mut entries: Vec<(K, V)> = source
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        Self { entries }
    }

    #[inline]
    fn try_add(&mut self, key: K, value: V) -> bool {
        match self.search(&key) {
            Ok(_) => false,
            Err(pos) => {
                self.entries.insert(pos, (key, value));
                true
            }
        }
    }

    #[inline]
    fn try_get_with<R>(&self, key: &K, read: impl FnOnce(&V) -> R) -> Option<R> {
        self.search(key).ok().map(|pos| read(&self.entries[pos].1))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_stay_sorted_under_random_inserts() {
        let mut map = SortedVecMap::with_capacity(8);
        for k in [5, 1, 9, 3, 7, 1, 5] {
            map.try_add(k, k * 10);
        }
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, [1, 3, 5, 7, 9]);
        assert_eq!(map.try_get(&7), Some(70));
    }
}
