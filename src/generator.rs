//! Reproducible generation of unique benchmark inputs.

use std::ops::Deref;

use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::container::SourceMap;
use crate::element::Element;
use crate::error::{HarnessError, Result};

const RETRY_FACTOR: usize = 32;
const RETRY_SLACK: usize = 1024;

/// An immutable sequence of pairwise-distinct values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSet<T> {
    values: Box<[T]>,
}

impl<T: Element> InputSet<T> {
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Source mapping with every value mapped to itself.
    pub fn to_source_map(&self) -> SourceMap<T, T> {
        self.values.iter().map(|v| (v.clone(), v.clone())).collect()
    }
}

impl<T> Deref for InputSet<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.values
    }
}

/// Produces arrays of unique values from a fixed seed.
#[derive(Debug, Clone, Copy)]
pub struct ValueGenerator {
    seed: u64,
}

impl ValueGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generates `count` pairwise-distinct values of `T`.
    ///
    /// Draws uniformly and rejects collisions. Fails with
    /// [`HarnessError::GenerationExhausted`] when `count` exceeds the type's
    /// distinct-value space or the retry budget runs out.
    pub fn generate<T: Element>(&self, count: i64) -> Result<InputSet<T>> {
        let count = usize::try_from(count).map_err(|_| HarnessError::InvalidSize(count))?;
        let element = T::ELEMENT_TYPE;

        if let Some(space) = element.key_space() {
            if count as u128 > u128::from(space) {
                return Err(HarnessError::GenerationExhausted {
                    element,
                    requested: count,
                    reason: format!("only {space} distinct values exist"),
                });
            }
        }

        let mut seen: HashSet<T> = HashSet::new();
        let mut values: Vec<T> = Vec::new();
        let reserved = values
            .try_reserve_exact(count)
            .map_err(|e| e.to_string())
            .and_then(|()| seen.try_reserve(count).map_err(|e| format!("{e:?}")));
        if let Err(reason) = reserved {
            return Err(HarnessError::GenerationExhausted {
                element,
                requested: count,
                reason: format!("cannot allocate input storage: {reason}"),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let budget = count.saturating_mul(RETRY_FACTOR).saturating_add(RETRY_SLACK);
        let mut draws = 0usize;

        while values.len() < count {
            if draws == budget {
                return Err(HarnessError::GenerationExhausted {
                    element,
                    requested: count,
                    reason: format!("retry budget of {budget} draws spent at {} values", values.len()),
                });
            }
            draws += 1;

            let candidate = T::draw(&mut rng);
            if seen.insert(candidate.clone()) {
                values.push(candidate);
            }
        }

        tracing::debug!(%element, count, draws, "generated input set");
        Ok(InputSet {
            values: values.into_boxed_slice(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ObjectRecord, ValueRecord};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn assert_unique<T: Element>(values: &[T]) {
        let distinct: HashSet<&T> = values.iter().collect();
        assert_eq!(distinct.len(), values.len());
    }

    #[test]
    fn zero_count_is_empty() {
        let set = ValueGenerator::new(1).generate::<i32>(0).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn negative_count_is_rejected() {
        let err = ValueGenerator::new(1).generate::<i32>(-1).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidSize(-1)));
    }

    #[test]
    fn byte_space_can_be_filled_exactly() {
        let set = ValueGenerator::new(7).generate::<u8>(256).unwrap();
        assert_eq!(set.len(), 256);
        assert_unique(&set);
    }

    #[test]
    fn byte_space_overflow_is_exhausted() {
        let err = ValueGenerator::new(7).generate::<u8>(257).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::GenerationExhausted { requested: 257, .. }
        ));
    }

    #[test]
    fn unallocatable_count_is_exhausted() {
        let err = ValueGenerator::new(7).generate::<Arc<str>>(1 << 62).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::GenerationExhausted { requested, .. } if requested == 1 << 62
        ));
    }

    #[test]
    fn records_are_unique_by_key() {
        let values = ValueGenerator::new(3).generate::<ValueRecord>(2_000).unwrap();
        assert_unique(&values);
        let objects = ValueGenerator::new(3).generate::<ObjectRecord>(2_000).unwrap();
        let keys: HashSet<i32> = objects.iter().map(ObjectRecord::key).collect();
        assert_eq!(keys.len(), 2_000);
    }

    #[test]
    fn source_map_maps_values_to_themselves() {
        let set = ValueGenerator::new(5).generate::<Arc<str>>(100).unwrap();
        let source = set.to_source_map();
        assert_eq!(source.len(), 100);
        assert!(set.iter().all(|k| source.get(k) == Some(k)));
    }

    proptest! {
        #[test]
        fn generated_values_are_distinct(count in 0i64..3_000, seed in any::<u64>()) {
            let set = ValueGenerator::new(seed).generate::<i32>(count).unwrap();
            prop_assert_eq!(set.len() as i64, count);
            let distinct: HashSet<&i32> = set.iter().collect();
            prop_assert_eq!(distinct.len(), set.len());
        }

        #[test]
        fn same_seed_same_input(count in 0i64..500, seed in any::<u64>()) {
            let generator = ValueGenerator::new(seed);
            let first = generator.generate::<Arc<str>>(count).unwrap();
            let second = generator.generate::<Arc<str>>(count).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
