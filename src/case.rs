//! Benchmark cases: one container kind, one input set, one timed operation.

use std::fmt;
use std::hint::black_box;
use std::marker::PhantomData;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::container::{
    ConcurrentHashMap, Container, ContainerKind, HashMapContainer, HashSetContainer,
    PersistentHashMap, PersistentOrderedMap, Probe, Prober, SharedContainer, SortedVecMap,
    TreeMap,
};
use crate::element::{Element, ElementType, ObjectRecord, ValueRecord};
use crate::error::{CaseFailure, HarnessError, Result};
use crate::generator::{InputSet, ValueGenerator};

/// The logical operation a case times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    /// Insert every input into a fresh container.
    TryAdd,
    /// Look up every input in a prefilled container.
    TryGetValue,
    /// As `TryGetValue`, with every probe dispatched through a trait object.
    TryGetValueDyn,
}

/// Tags used to include or exclude groups of cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Collections,
    GenericCollections,
    Virtual,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::TryAdd,
        Operation::TryGetValue,
        Operation::TryGetValueDyn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::TryAdd => "TryAdd",
            Operation::TryGetValue => "TryGetValue",
            Operation::TryGetValueDyn => "TryGetValueDyn",
        }
    }

    pub fn categories(self) -> &'static [Category] {
        match self {
            Operation::TryAdd | Operation::TryGetValue => {
                &[Category::Collections, Category::GenericCollections]
            }
            Operation::TryGetValueDyn => &[
                Category::Collections,
                Category::GenericCollections,
                Category::Virtual,
            ],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a case, carried on results and failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId {
    pub operation: Operation,
    pub element: ElementType,
    pub size: i64,
    pub kind: ContainerKind,
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}<{}>/{}",
            self.operation, self.kind, self.element, self.size
        )
    }
}

/// Everything needed to build a case; cheap to create, does no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePlan {
    pub id: CaseId,
    pub seed: u64,
    pub concurrent_workers: usize,
}

impl CasePlan {
    fn parallel_add(&self) -> bool {
        self.id.operation == Operation::TryAdd
            && self.id.kind == ContainerKind::ConcurrentHashMap
            && self.concurrent_workers > 1
    }
}

/// A runnable case. `setup` runs once before any timed call to `run`.
pub trait BenchmarkCase {
    fn id(&self) -> &CaseId;

    /// Generates inputs and builds any shared state. Untimed.
    fn setup(&mut self) -> Result<()>;

    /// Releases what the previous `run` produced. Untimed.
    fn reset(&mut self) {}

    /// One full pass over the input. This is the timed unit.
    fn run(&mut self) -> std::result::Result<(), CaseFailure>;

    /// Entry count of the container the last `run` built or probed.
    fn retained_len(&self) -> Option<usize>;
}

/// Inserts every input into a container constructed inside the timed pass.
pub struct AddCase<T, C> {
    id: CaseId,
    generator: ValueGenerator,
    inputs: Option<InputSet<T>>,
    output: Option<C>,
}

impl<T: Element, C: Container<T, T>> AddCase<T, C> {
    pub fn new(plan: &CasePlan) -> Self {
        Self {
            id: plan.id.clone(),
            generator: ValueGenerator::new(plan.seed),
            inputs: None,
            output: None,
        }
    }
}

impl<T: Element, C: Container<T, T>> BenchmarkCase for AddCase<T, C> {
    fn id(&self) -> &CaseId {
        &self.id
    }

    fn setup(&mut self) -> Result<()> {
        self.inputs = Some(self.generator.generate::<T>(self.id.size)?);
        Ok(())
    }

    fn reset(&mut self) {
        self.output = None;
    }

    fn run(&mut self) -> std::result::Result<(), CaseFailure> {
        let inputs = self.inputs.as_ref().ok_or(CaseFailure::NotSetUp)?;
        let mut container = C::with_capacity(inputs.len());
        let mut added = 0usize;
        for value in inputs.iter() {
            added += usize::from(container.try_add(value.clone(), value.clone()));
        }
        self.output = Some(black_box(container));

        if added != inputs.len() {
            return Err(CaseFailure::DuplicateInsert {
                expected: inputs.len(),
                actual: added,
            });
        }
        Ok(())
    }

    fn retained_len(&self) -> Option<usize> {
        self.output.as_ref().map(|c| c.len())
    }
}

/// Inserts from a dedicated worker pool into a fresh shared container.
pub struct ParallelAddCase<T, C> {
    id: CaseId,
    generator: ValueGenerator,
    workers: usize,
    pool: Option<rayon::ThreadPool>,
    inputs: Option<InputSet<T>>,
    output: Option<C>,
}

impl<T: Element, C: SharedContainer<T, T>> ParallelAddCase<T, C> {
    pub fn new(plan: &CasePlan) -> Self {
        Self {
            id: plan.id.clone(),
            generator: ValueGenerator::new(plan.seed),
            workers: plan.concurrent_workers,
            pool: None,
            inputs: None,
            output: None,
        }
    }
}

impl<T: Element, C: SharedContainer<T, T>> BenchmarkCase for ParallelAddCase<T, C> {
    fn id(&self) -> &CaseId {
        &self.id
    }

    fn setup(&mut self) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("bench-worker-{i}"))
            .build()
            .map_err(|e| {
                HarnessError::InvalidConfig(format!("cannot start {} workers: {e}", self.workers))
            })?;
        self.pool = Some(pool);
        self.inputs = Some(self.generator.generate::<T>(self.id.size)?);
        Ok(())
    }

    fn reset(&mut self) {
        self.output = None;
    }

    fn run(&mut self) -> std::result::Result<(), CaseFailure> {
        let (Some(pool), Some(inputs)) = (self.pool.as_ref(), self.inputs.as_ref()) else {
            return Err(CaseFailure::NotSetUp);
        };
        let container = C::with_capacity(inputs.len());
        let added = pool.install(|| {
            inputs
                .as_slice()
                .par_iter()
                .filter(|value| container.try_add_shared((*value).clone(), (*value).clone()))
                .count()
        });
        self.output = Some(black_box(container));

        if added != inputs.len() {
            return Err(CaseFailure::DuplicateInsert {
                expected: inputs.len(),
                actual: added,
            });
        }
        Ok(())
    }

    fn retained_len(&self) -> Option<usize> {
        self.output.as_ref().map(|c| c.len())
    }
}

/// Looks up every input in one container built during setup.
pub struct LookupCase<T, C> {
    id: CaseId,
    generator: ValueGenerator,
    inputs: Option<InputSet<T>>,
    container: Option<C>,
}

impl<T: Element, C: Container<T, T>> LookupCase<T, C> {
    pub fn new(plan: &CasePlan) -> Self {
        Self {
            id: plan.id.clone(),
            generator: ValueGenerator::new(plan.seed),
            inputs: None,
            container: None,
        }
    }
}

impl<T: Element, C: Container<T, T>> BenchmarkCase for LookupCase<T, C> {
    fn id(&self) -> &CaseId {
        &self.id
    }

    fn setup(&mut self) -> Result<()> {
        let inputs = self.generator.generate::<T>(self.id.size)?;
        self.container = Some(C::from_source(&inputs.to_source_map()));
        self.inputs = Some(inputs);
        Ok(())
    }

    fn run(&mut self) -> std::result::Result<(), CaseFailure> {
        let (Some(container), Some(inputs)) = (self.container.as_ref(), self.inputs.as_ref())
        else {
            return Err(CaseFailure::NotSetUp);
        };
        let mut hits = 0usize;
        for key in inputs.iter() {
            let found = container.try_get_with(key, |v| {
                black_box(v);
            });
            hits += usize::from(found.is_some());
        }

        if black_box(hits) != inputs.len() {
            return Err(CaseFailure::MissingKeys {
                expected: inputs.len(),
                actual: hits,
            });
        }
        Ok(())
    }

    fn retained_len(&self) -> Option<usize> {
        self.container.as_ref().map(|c| c.len())
    }
}

/// Lookup through `&dyn Probe`, so every probe is an indirect call.
pub struct DynLookupCase<T, C> {
    id: CaseId,
    generator: ValueGenerator,
    inputs: Option<InputSet<T>>,
    probe: Option<Box<dyn Probe<T>>>,
    len: usize,
    _container: PhantomData<fn() -> C>,
}

impl<T: Element, C: Container<T, T> + 'static> DynLookupCase<T, C> {
    pub fn new(plan: &CasePlan) -> Self {
        Self {
            id: plan.id.clone(),
            generator: ValueGenerator::new(plan.seed),
            inputs: None,
            probe: None,
            len: 0,
            _container: PhantomData,
        }
    }
}

impl<T: Element, C: Container<T, T> + 'static> BenchmarkCase for DynLookupCase<T, C> {
    fn id(&self) -> &CaseId {
        &self.id
    }

    fn setup(&mut self) -> Result<()> {
        let inputs = self.generator.generate::<T>(self.id.size)?;
        let container = C::from_source(&inputs.to_source_map());
        self.len = container.len();
        self.probe = Some(Box::new(Prober::<C, T>::new(container)));
        self.inputs = Some(inputs);
        Ok(())
    }

    fn run(&mut self) -> std::result::Result<(), CaseFailure> {
        let (Some(probe), Some(inputs)) = (self.probe.as_deref(), self.inputs.as_ref()) else {
            return Err(CaseFailure::NotSetUp);
        };
        let probe: &dyn Probe<T> = black_box(probe);
        let hits = inputs.iter().filter(|key| probe.probe(key)).count();

        if black_box(hits) != inputs.len() {
            return Err(CaseFailure::MissingKeys {
                expected: inputs.len(),
                actual: hits,
            });
        }
        Ok(())
    }

    fn retained_len(&self) -> Option<usize> {
        self.probe.as_ref().map(|_| self.len)
    }
}

fn with_container<T, C>(plan: &CasePlan) -> Box<dyn BenchmarkCase>
where
    T: Element,
    C: Container<T, T> + 'static,
{
    match plan.id.operation {
        Operation::TryAdd => Box::new(AddCase::<T, C>::new(plan)),
        Operation::TryGetValue => Box::new(LookupCase::<T, C>::new(plan)),
        Operation::TryGetValueDyn => Box::new(DynLookupCase::<T, C>::new(plan)),
    }
}

/// Builds a case for `T` on any container kind that only needs hashing.
pub fn build<T: Element>(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
    let case: Box<dyn BenchmarkCase> = match plan.id.kind {
        ContainerKind::UnorderedHashMap => with_container::<T, HashMapContainer<T, T>>(plan),
        ContainerKind::ConcurrentHashMap if plan.parallel_add() => {
            Box::new(ParallelAddCase::<T, ConcurrentHashMap<T, T>>::new(plan))
        }
        ContainerKind::ConcurrentHashMap => with_container::<T, ConcurrentHashMap<T, T>>(plan),
        ContainerKind::PersistentHashMap => with_container::<T, PersistentHashMap<T, T>>(plan),
        ContainerKind::HashSet => with_container::<T, HashSetContainer<T>>(plan),
        ContainerKind::SortedVecMap
        | ContainerKind::TreeMap
        | ContainerKind::PersistentOrderedMap => return T::build_ordered_case(plan),
    };
    Ok(case)
}

/// Builds a case for `T` on a container kind that needs a total order.
pub fn build_ordered<T: Element + Ord>(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
    let case: Box<dyn BenchmarkCase> = match plan.id.kind {
        ContainerKind::SortedVecMap => with_container::<T, SortedVecMap<T, T>>(plan),
        ContainerKind::TreeMap => with_container::<T, TreeMap<T, T>>(plan),
        ContainerKind::PersistentOrderedMap => {
            with_container::<T, PersistentOrderedMap<T, T>>(plan)
        }
        _ => return build::<T>(plan),
    };
    Ok(case)
}

/// Instantiates the case a plan describes for its element type.
pub fn build_case(plan: &CasePlan) -> Result<Box<dyn BenchmarkCase>> {
    match plan.id.element {
        ElementType::IntegerKey => build::<i32>(plan),
        ElementType::StringKey => build::<Arc<str>>(plan),
        ElementType::ValueRecord => build::<ValueRecord>(plan),
        ElementType::ObjectRecord => build::<ObjectRecord>(plan),
        ElementType::ByteKey => build::<u8>(plan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(operation: Operation, element: ElementType, kind: ContainerKind, size: i64) -> CasePlan {
        CasePlan {
            id: CaseId {
                operation,
                element,
                size,
                kind,
            },
            seed: 12345,
            concurrent_workers: 1,
        }
    }

    #[test]
    fn add_case_inserts_every_value_once() {
        let plan = plan(
            Operation::TryAdd,
            ElementType::IntegerKey,
            ContainerKind::UnorderedHashMap,
            1000,
        );
        let mut case = AddCase::<i32, HashMapContainer<i32, i32>>::new(&plan);
        case.setup().unwrap();
        case.run().unwrap();

        let inputs = case.inputs.clone().unwrap();
        let output = case.output.as_mut().unwrap();
        assert_eq!(output.len(), 1000);
        assert!(inputs.iter().all(|&k| !output.try_add(k, k)));
    }

    #[test]
    fn each_run_gets_a_fresh_container() {
        let plan = plan(Operation::TryAdd, ElementType::StringKey, ContainerKind::TreeMap, 64);
        let mut case = build_case(&plan).unwrap();
        case.setup().unwrap();
        for _ in 0..3 {
            case.reset();
            assert_eq!(case.retained_len(), None);
            case.run().unwrap();
            assert_eq!(case.retained_len(), Some(64));
        }
    }

    #[test]
    fn run_before_setup_fails() {
        let plan = plan(Operation::TryGetValue, ElementType::IntegerKey, ContainerKind::HashSet, 8);
        let mut case = build_case(&plan).unwrap();
        assert_eq!(case.run(), Err(CaseFailure::NotSetUp));
    }

    #[test]
    fn lookups_hit_on_every_kind() {
        for kind in ContainerKind::ALL {
            for operation in [Operation::TryGetValue, Operation::TryGetValueDyn] {
                let plan = plan(operation, ElementType::ValueRecord, kind, 300);
                let mut case = build_case(&plan).unwrap();
                case.setup().unwrap();
                case.run().unwrap();
                assert_eq!(case.retained_len(), Some(300), "{}", plan.id);
            }
        }
    }

    /// Hashable key with no `Ord`.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Handle(u32);

    impl Element for Handle {
        const ELEMENT_TYPE: ElementType = ElementType::IntegerKey;

        fn draw<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
            Handle(rng.gen())
        }
    }

    #[test]
    fn unordered_elements_reject_ordered_kinds() {
        for kind in [
            ContainerKind::SortedVecMap,
            ContainerKind::TreeMap,
            ContainerKind::PersistentOrderedMap,
        ] {
            let plan = plan(Operation::TryAdd, ElementType::IntegerKey, kind, 8);
            assert!(matches!(
                build::<Handle>(&plan),
                Err(HarnessError::UnsupportedCombination { .. })
            ));
        }
        let plan = plan(Operation::TryAdd, ElementType::IntegerKey, ContainerKind::HashSet, 8);
        let mut case = build::<Handle>(&plan).unwrap();
        case.setup().unwrap();
        case.run().unwrap();
        assert_eq!(case.retained_len(), Some(8));
    }

    #[test]
    fn object_records_fit_ordered_kinds() {
        for kind in [
            ContainerKind::SortedVecMap,
            ContainerKind::TreeMap,
            ContainerKind::PersistentOrderedMap,
        ] {
            for operation in Operation::ALL {
                let plan = plan(operation, ElementType::ObjectRecord, kind, 200);
                let mut case = build_case(&plan).unwrap();
                case.setup().unwrap();
                case.run().unwrap();
                assert_eq!(case.retained_len(), Some(200), "{}", plan.id);
            }
        }
    }

    #[test]
    fn parallel_add_fills_concurrent_map() {
        let mut plan = plan(
            Operation::TryAdd,
            ElementType::IntegerKey,
            ContainerKind::ConcurrentHashMap,
            5_000,
        );
        plan.concurrent_workers = 4;
        let mut case = ParallelAddCase::<i32, ConcurrentHashMap<i32, i32>>::new(&plan);
        case.setup().unwrap();
        case.run().unwrap();
        assert_eq!(case.retained_len(), Some(5_000));
    }

    #[test]
    fn zero_size_runs_an_empty_pass() {
        let plan = plan(Operation::TryAdd, ElementType::IntegerKey, ContainerKind::SortedVecMap, 0);
        let mut case = build_case(&plan).unwrap();
        case.setup().unwrap();
        case.run().unwrap();
        assert_eq!(case.retained_len(), Some(0));
    }
}
