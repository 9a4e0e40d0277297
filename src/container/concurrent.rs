use std::hash::{BuildHasher, Hash};

use hashbrown::hash_map::Entry;
use hashbrown::{DefaultHashBuilder, HashMap};
use parking_lot::RwLock;
use rayon::prelude::*;

use super::{Container, ContainerKind, SharedContainer, SourceMap};

/// Thread-safe hash map split into independently locked shards.
///
/// A key's shard is picked from its hash, so each operation takes exactly one
/// shard lock. Bulk construction fills the shards in parallel on the rayon
/// pool.
pub struct ConcurrentHashMap<K, V> {
    hasher: DefaultHashBuilder,
    shards: Box<[RwLock<HashMap<K, V>>]>,
}

/// Shard count: four per available core, rounded up to a power of two.
fn default_shard_count() -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    (cores * 4).next_power_of_two()
}

impl<K: Eq + Hash, V> ConcurrentHashMap<K, V> {
    pub fn with_shards(shard_count: usize, capacity: usize) -> Self {
        let shard_count = shard_count.max(1).next_power_of_two();
        let per_shard = capacity.div_ceil(shard_count);
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::with_capacity(per_shard)))
            .collect();
        Self {
            hasher: DefaultHashBuilder::default(),
            shards,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    fn shard_index(&self, key: &K) -> usize {
        // Shard count is a power of two.
        (self.hasher.hash_one(key) as usize) & (self.shards.len() - 1)
    }
}

impl<K, V> Container<K, V> for ConcurrentHashMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    const KIND: ContainerKind = ContainerKind::ConcurrentHashMap;

    fn with_capacity(capacity: usize) -> Self {
        Self::with_shards(default_shard_count(), capacity)
    }

    fn from_source(source: &SourceMap<K, V>) -> Self {
        let mut map = Self::with_shards(default_shard_count(), 0);
        let mut buckets: Vec<Vec<(&K, &V)>> = vec![Vec::new(); map.shards.len()];
        for (k, v) in source {
            buckets[map.shard_index(k)].push((k, v));
        }
        map.shards
            .par_iter_mut()
            .zip(buckets.into_par_iter())
            .for_each(|(shard, bucket)| {
                let shard = shard.get_mut();
                shard.reserve(bucket.len());
                shard.extend(bucket.into_iter().map(|(k, v)| (k.clone(), v.clone())));
            });
        map
    }

    /// Takes the shard's write lock even with exclusive access, so sequential
    /// adds time the synchronized path.
    #[inline]
    fn try_add(&mut self, key: K, value: V) -> bool {
        self.try_add_shared(key, value)
    }

    #[inline]
    fn try_get_with<R>(&self, key: &K, read: impl FnOnce(&V) -> R) -> Option<R> {
        let guard = self.shards[self.shard_index(key)].read();
        guard.get(key).map(read)
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }
}

impl<K, V> SharedContainer<K, V> for ConcurrentHashMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    #[inline]
    fn try_add_shared(&self, key: K, value: V) -> bool {
        let mut guard = self.shards[self.shard_index(&key)].write();
        match guard.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_count_is_rounded_to_power_of_two() {
        let map: ConcurrentHashMap<i32, i32> = ConcurrentHashMap::with_shards(6, 100);
        assert_eq!(map.shard_count(), 8);
    }

    #[test]
    fn parallel_inserts_land_exactly_once() {
        let map: ConcurrentHashMap<i32, i32> = ConcurrentHashMap::with_shards(8, 0);
        let added = (0..10_000)
            .into_par_iter()
            .chain((0..10_000).into_par_iter())
            .filter(|&k| map.try_add_shared(k, k))
            .count();
        assert_eq!(added, 10_000);
        assert_eq!(map.len(), 10_000);
        assert_eq!(map.try_get(&1234), Some(1234));
    }

    #[test]
    fn exclusive_add_waits_for_the_shard_lock() {
        use parking_lot::lock_api::RawRwLock as _;
        use std::sync::mpsc;
        use std::time::Duration;

        let mut map: ConcurrentHashMap<i32, i32> = ConcurrentHashMap::with_shards(1, 0);
        // Never released; the adding thread stays parked.
        unsafe { map.shards[0].raw() }.lock_exclusive();

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(map.try_add(1, 1));
        });
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(200)),
            Err(mpsc::RecvTimeoutError::Timeout)
        );
    }

    #[test]
    fn exclusive_add_rejects_duplicates() {
        let mut map: ConcurrentHashMap<i32, i32> = ConcurrentHashMap::with_shards(4, 16);
        assert!(map.try_add(7, 70));
        assert!(!map.try_add(7, 71));
        assert_eq!(map.try_get(&7), Some(70));
    }
}
