//! Uniform try-add / try-get surface over structurally different containers.
//!
//! Every [`ContainerKind`] has one adapter type implementing [`Container`], so
//! the timed loops in [`crate::case`] are written once and monomorphized per
//! kind, with no per-kind branching in the hot path.

mod concurrent;
mod hash;
mod persistent;
mod sorted;
mod tree;

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

pub use concurrent::ConcurrentHashMap;
pub use hash::{HashMapContainer, HashSetContainer};
pub use persistent::{PersistentHashMap, PersistentOrderedMap};
pub use sorted::SortedVecMap;
pub use tree::TreeMap;

/// Pre-populated mapping that lookup cases bulk-construct containers from.
pub type SourceMap<K, V> = hashbrown::HashMap<K, V>;

/// The container implementations under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerKind {
    UnorderedHashMap,
    ConcurrentHashMap,
    SortedVecMap,
    TreeMap,
    PersistentHashMap,
    PersistentOrderedMap,
    HashSet,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 7] = [
        ContainerKind::UnorderedHashMap,
        ContainerKind::ConcurrentHashMap,
        ContainerKind::SortedVecMap,
        ContainerKind::TreeMap,
        ContainerKind::PersistentHashMap,
        ContainerKind::PersistentOrderedMap,
        ContainerKind::HashSet,
    ];

    /// Whether the kind orders its keys and so needs a total order on them.
    pub fn requires_total_order(self) -> bool {
        matches!(
            self,
            ContainerKind::SortedVecMap | ContainerKind::TreeMap | ContainerKind::PersistentOrderedMap
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::UnorderedHashMap => "UnorderedHashMap",
            ContainerKind::ConcurrentHashMap => "ConcurrentHashMap",
            ContainerKind::SortedVecMap => "SortedVecMap",
            ContainerKind::TreeMap => "TreeMap",
            ContainerKind::PersistentHashMap => "PersistentHashMap",
            ContainerKind::PersistentOrderedMap => "PersistentOrderedMap",
            ContainerKind::HashSet => "HashSet",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adapter contract shared by every container kind.
pub trait Container<K, V>: Sized {
    const KIND: ContainerKind;

    /// Allocates an empty instance. The hint never changes map semantics.
    fn with_capacity(capacity: usize) -> Self;

    /// Bulk-constructs an instance holding exactly the keys of `source`.
    fn from_source(source: &SourceMap<K, V>) -> Self;

    /// Inserts if `key` is absent. Returns whether an insertion happened.
    fn try_add(&mut self, key: K, value: V) -> bool;

    /// Runs `read` on the stored value if `key` is present.
    fn try_get_with<R>(&self, key: &K, read: impl FnOnce(&V) -> R) -> Option<R>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.try_get_with(key, V::clone)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.try_get_with(key, |_| ()).is_some()
    }
}

/// Containers that accept insertion from several threads at once.
pub trait SharedContainer<K, V>: Container<K, V> + Sync {
    fn try_add_shared(&self, key: K, value: V) -> bool;
}

/// Object-safe lookup surface, used to measure lookups through dynamic dispatch.
pub trait Probe<K> {
    fn probe(&self, key: &K) -> bool;
}

/// Wraps a container so it can be handed out as `&dyn Probe<K>`.
pub struct Prober<C, V> {
    container: C,
    _value: PhantomData<fn() -> V>,
}

impl<C, V> Prober<C, V> {
    pub fn new(container: C) -> Self {
        Self {
            container,
            _value: PhantomData,
        }
    }
}

impl<K, V, C: Container<K, V>> Probe<K> for Prober<C, V> {
    fn probe(&self, key: &K) -> bool {
        self.container.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ValueGenerator;
    use proptest::prelude::*;

    fn exercise_from_source<C: Container<i32, i32>>(keys: &[i32], missing: &[i32]) {
        let source: SourceMap<i32, i32> = keys.iter().map(|&k| (k, k)).collect();
        let container = C::from_source(&source);
        assert_eq!(container.len(), keys.len(), "{}", C::KIND);
        for k in keys {
            assert_eq!(container.try_get(k), Some(*k), "{} lost {k}", C::KIND);
        }
        for k in missing {
            assert_eq!(container.try_get(k), None, "{} invented {k}", C::KIND);
        }
    }

    fn exercise_try_add<C: Container<i32, i32>>(keys: &[i32]) {
        let mut container = C::with_capacity(keys.len());
        assert!(container.is_empty());
        for &k in keys {
            assert!(container.try_add(k, k), "{} rejected {k}", C::KIND);
        }
        for &k in keys {
            assert!(!container.try_add(k, k.wrapping_add(1)), "{} re-added {k}", C::KIND);
            assert_eq!(container.try_get(&k), Some(k), "{} overwrote {k}", C::KIND);
        }
        assert_eq!(container.len(), keys.len());
    }

    fn every_kind(keys: &[i32], missing: &[i32]) {
        exercise_from_source::<HashMapContainer<i32, i32>>(keys, missing);
        exercise_from_source::<ConcurrentHashMap<i32, i32>>(keys, missing);
        exercise_from_source::<SortedVecMap<i32, i32>>(keys, missing);
        exercise_from_source::<TreeMap<i32, i32>>(keys, missing);
        exercise_from_source::<PersistentHashMap<i32, i32>>(keys, missing);
        exercise_from_source::<PersistentOrderedMap<i32, i32>>(keys, missing);
        exercise_from_source::<HashSetContainer<i32>>(keys, missing);

        exercise_try_add::<HashMapContainer<i32, i32>>(keys);
        exercise_try_add::<ConcurrentHashMap<i32, i32>>(keys);
        exercise_try_add::<SortedVecMap<i32, i32>>(keys);
        exercise_try_add::<TreeMap<i32, i32>>(keys);
        exercise_try_add::<PersistentHashMap<i32, i32>>(keys);
        exercise_try_add::<PersistentOrderedMap<i32, i32>>(keys);
        exercise_try_add::<HashSetContainer<i32>>(keys);
    }

    #[test]
    fn every_kind_honours_the_contract() {
        let values = ValueGenerator::new(99).generate::<i32>(600).unwrap();
        let (keys, missing) = values.split_at(500);
        every_kind(keys, missing);
    }

    #[test]
    fn empty_source_builds_empty_containers() {
        every_kind(&[], &[1, 2, 3]);
    }

    #[test]
    fn dyn_probe_sees_inserted_keys() {
        let source: SourceMap<i32, i32> = (0..10).map(|k| (k, k)).collect();
        let probe: Box<dyn Probe<i32>> =
            Box::new(Prober::<_, i32>::new(TreeMap::<i32, i32>::from_source(&source)));
        assert!(probe.probe(&3));
        assert!(!probe.probe(&10));
    }

    #[test]
    fn only_ordered_kinds_need_total_order() {
        let ordered: Vec<_> = ContainerKind::ALL
            .into_iter()
            .filter(|k| k.requires_total_order())
            .collect();
        assert_eq!(
            ordered,
            [
                ContainerKind::SortedVecMap,
                ContainerKind::TreeMap,
                ContainerKind::PersistentOrderedMap
            ]
        );
    }

    proptest! {
        #[test]
        fn from_source_round_trips(keys in proptest::collection::hash_set(any::<i32>(), 0..300)) {
            let keys: Vec<i32> = keys.into_iter().collect();
            let source: SourceMap<i32, i32> = keys.iter().map(|&k| (k, k)).collect();
            let sorted = SortedVecMap::<i32, i32>::from_source(&source);
            let persistent = PersistentOrderedMap::<i32, i32>::from_source(&source);
            for k in &keys {
                prop_assert!(sorted.contains_key(k));
                prop_assert!(persistent.contains_key(k));
            }
            prop_assert_eq!(sorted.len(), keys.len());
        }
    }
}
