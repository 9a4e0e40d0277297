//! Expansion of the configured selections into concrete case plans.

use std::fmt;

use crate::case::{CaseId, CasePlan, Category, Operation};
use crate::config::HarnessConfig;
use crate::container::ContainerKind;
use crate::element::ElementType;
use crate::error::HarnessError;

type Predicate = dyn Fn(ElementType, ContainerKind, Operation) -> bool + Send + Sync;

/// Inclusion predicate applied before any case is set up.
pub struct CaseFilter {
    predicate: Box<Predicate>,
}

impl CaseFilter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(ElementType, ContainerKind, Operation) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// Keeps only operations tagged with `category`.
    pub fn category(category: Category) -> Self {
        Self::new(move |_, _, operation| operation.categories().contains(&category))
    }

    pub fn matches(&self, element: ElementType, kind: ContainerKind, operation: Operation) -> bool {
        (self.predicate)(element, kind, operation)
    }
}

impl fmt::Debug for CaseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseFilter").finish_non_exhaustive()
    }
}

/// Cross product of operations × element types × sizes × container kinds.
///
/// Pairings where the kind needs a total order the element type lacks are
/// omitted, as are combinations the filter rejects.
pub fn expand(config: &HarnessConfig, filter: Option<&CaseFilter>) -> Vec<CasePlan> {
    let mut plans = Vec::new();
    for &operation in &config.operations {
        for &element in &config.element_types {
            for &size in &config.sizes {
                for &kind in &config.container_kinds {
                    if kind.requires_total_order() && !element.has_total_order() {
                        tracing::debug!(
                            "skipping: {}",
                            HarnessError::UnsupportedCombination { element, kind }
                        );
                        continue;
                    }
                    if filter.is_some_and(|f| !f.matches(element, kind, operation)) {
                        continue;
                    }
                    plans.push(CasePlan {
                        id: CaseId {
                            operation,
                            element,
                            size,
                            kind,
                        },
                        seed: config.seed,
                        concurrent_workers: config.concurrent_workers,
                    });
                }
            }
        }
    }
    plans
}
