//! Element types that benchmark inputs are drawn from.
//!
//! The set is closed: every [`ElementType`] variant maps to exactly one Rust
//! type implementing [`Element`]. Cloning any element is cheap (a copy or a
//! reference-count bump), so moving keys into a container during a timed pass
//! measures the container, not the allocator.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::case::{BenchmarkCase, CasePlan};
use crate::error::{HarnessError, Result};

/// Descriptor for one of the built-in element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    IntegerKey,
    StringKey,
    ValueRecord,
    ObjectRecord,
    ByteKey,
}

impl ElementType {
    pub const ALL: [ElementType; 5] = [
        ElementType::IntegerKey,
        ElementType::StringKey,
        ElementType::ValueRecord,
        ElementType::ObjectRecord,
        ElementType::ByteKey,
    ];

    /// The four element types benchmarked by default.
    pub const DEFAULT: [ElementType; 4] = [
        ElementType::IntegerKey,
        ElementType::StringKey,
        ElementType::ValueRecord,
        ElementType::ObjectRecord,
    ];

    /// Whether the type supplies a total order, as ordered containers require.
    pub fn has_total_order(self) -> bool {
        match self {
            ElementType::IntegerKey
            | ElementType::StringKey
            | ElementType::ValueRecord
            | ElementType::ObjectRecord
            | ElementType::ByteKey => true,
        }
    }

    /// Number of distinct values the type can represent, `None` if unbounded.
    pub fn key_space(self) -> Option<u64> {
        match self {
            ElementType::IntegerKey | ElementType::ValueRecord | ElementType::ObjectRecord => {
                Some(1 << 32)
            }
            ElementType::ByteKey => Some(1 << 8),
            ElementType::StringKey => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::IntegerKey => "IntegerKey",
            ElementType::StringKey => "StringKey",
            ElementType::ValueRecord => "ValueRecord",
            ElementType::ObjectRecord => "ObjectRecord",
            ElementType::ByteKey => "ByteKey",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value type that can be generated and stored in the containers under test.
pub trait Element: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    /// Draws one value. Collisions are handled by the generator.
    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Builds a case for a container kind that needs a total order.
    ///
    /// Types without `Ord` keep the default, which reports the pairing as
    /// unsupported.
    fn build_ordered_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
        Err(HarnessError::UnsupportedCombination {
            element: Self::ELEMENT_TYPE,
            kind: plan.id.kind,
        })
    }
}

impl Element for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::IntegerKey;

    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.gen()
    }

    fn build_ordered_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
        crate::case::build_ordered::<Self>(plan)
    }
}

impl Element for u8 {
    const ELEMENT_TYPE: ElementType = ElementType::ByteKey;

    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.gen()
    }

    fn build_ordered_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
        crate::case::build_ordered::<Self>(plan)
    }
}

const MIN_STRING_LEN: usize = 8;
const MAX_STRING_LEN: usize = 32;

impl Element for Arc<str> {
    const ELEMENT_TYPE: ElementType = ElementType::StringKey;

    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let len = rng.gen_range(MIN_STRING_LEN..=MAX_STRING_LEN);
        let s: String = (0..len).map(|_| rng.sample(Alphanumeric) as char).collect();
        Arc::from(s)
    }

    fn build_ordered_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
        crate::case::build_ordered::<Self>(plan)
    }
}

/// Stack-allocated record compared by its `key` field only.
#[derive(Debug, Clone, Copy)]
pub struct ValueRecord {
    pub key: i32,
    pub weight: i64,
    pub flags: u32,
}

impl ValueRecord {
    pub fn new(key: i32) -> Self {
        Self {
            key,
            weight: i64::from(key).wrapping_mul(31),
            flags: key as u32 & 0xff,
        }
    }
}

impl PartialEq for ValueRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ValueRecord {}

impl Hash for ValueRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ValueRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValueRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Element for ValueRecord {
    const ELEMENT_TYPE: ElementType = ElementType::ValueRecord;

    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ValueRecord::new(rng.gen())
    }

    fn build_ordered_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
        crate::case::build_ordered::<Self>(plan)
    }
}

#[derive(Debug)]
struct RecordBody {
    key: i32,
    label: Box<str>,
}

/// Heap-allocated record. Clones share the allocation; equality and hashing
/// look at the embedded key, never at the pointer, and so does ordering.
#[derive(Debug, Clone)]
pub struct ObjectRecord(Arc<RecordBody>);

impl ObjectRecord {
    pub fn new(key: i32) -> Self {
        Self(Arc::new(RecordBody {
            key,
            label: format!("object-{key}").into_boxed_str(),
        }))
    }

    pub fn key(&self) -> i32 {
        self.0.key
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }
}

impl PartialEq for ObjectRecord {
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl Eq for ObjectRecord {}

impl Hash for ObjectRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl PartialOrd for ObjectRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key.cmp(&other.0.key)
    }
}

impl Element for ObjectRecord {
    const ELEMENT_TYPE: ElementType = ElementType::ObjectRecord;

    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ObjectRecord::new(rng.gen())
    }

    fn build_ordered_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
        crate::case::build_ordered::<Self>(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn records_compare_by_key() {
        let a = ValueRecord { key: 7, weight: 1, flags: 0 };
        let b = ValueRecord { key: 7, weight: 99, flags: 3 };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(ValueRecord::new(1) < ValueRecord::new(2));
    }

    #[test]
    fn object_records_ignore_identity() {
        let a = ObjectRecord::new(42);
        let b = ObjectRecord::new(42);
        assert!(!Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.label(), "object-42");
        assert!(ObjectRecord::new(-5) < ObjectRecord::new(3));
    }

    #[test]
    fn descriptors_match_rust_types() {
        assert_eq!(<i32 as Element>::ELEMENT_TYPE, ElementType::IntegerKey);
        assert_eq!(<Arc<str> as Element>::ELEMENT_TYPE, ElementType::StringKey);
        assert_eq!(<u8 as Element>::ELEMENT_TYPE, ElementType::ByteKey);
        assert!(ElementType::ALL.iter().all(|t| t.has_total_order()));
        assert_eq!(ElementType::ByteKey.key_space(), Some(256));
        assert_eq!(ElementType::StringKey.key_space(), None);
    }

    #[test]
    fn string_keys_are_alphanumeric() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..64 {
            let key = <Arc<str> as Element>::draw(&mut rng);
            assert!((MIN_STRING_LEN..=MAX_STRING_LEN).contains(&key.len()));
            assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
