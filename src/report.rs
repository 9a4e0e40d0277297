//! Console comparison table for a finished run.

use std::collections::BTreeMap;
use std::fmt;

use crate::case::Operation;
use crate::element::ElementType;
use crate::engine::MeasurementResult;
use crate::runner::{CaseOutcome, ResultSink};

/// Collects outcomes and renders them grouped by operation, element type and
/// size, with one row per container kind.
#[derive(Debug, Default)]
pub struct ComparisonTable {
    outcomes: Vec<CaseOutcome>,
}

impl ComparisonTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups: BTreeMap<(Operation, ElementType, i64), Vec<&MeasurementResult>> =
            BTreeMap::new();
        for result in self.outcomes.iter().filter_map(CaseOutcome::measured) {
            let key = (result.case.operation, result.case.element, result.case.size);
            groups.entry(key).or_default().push(result);
        }

        for ((operation, element, size), mut rows) in groups {
            rows.sort_by(|a, b| a.mean_ns.total_cmp(&b.mean_ns));
            let fastest = rows[0].mean_ns;

            writeln!(f, "{}", "=".repeat(80))?;
            writeln!(f, "{operation}<{element}>   N = {size:>10}")?;
            writeln!(f, "{}", "=".repeat(80))?;
            for r in rows {
                let relative = if fastest > 0.0 { r.mean_ns / fastest } else { 1.0 };
                let trimmed = r
                    .trimmed_fraction
                    .map(|frac| format!("  trim {:.0}%", frac * 100.0))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "  {:<22} {:>12.1}ns  ±{:>5.1}%  {:>8.2}ns/op  {:>5.2}x  n={}{}",
                    r.case.kind.name(),
                    r.mean_ns,
                    percent(r.stddev_ns, r.mean_ns),
                    r.ns_per_element,
                    relative,
                    r.sample_count,
                    trimmed,
                )?;
            }
            writeln!(f)?;
        }

        let failures: Vec<_> = self
            .outcomes
            .iter()
            .filter_map(|o| match o {
                CaseOutcome::Failed { case, error } => Some((case, error)),
                CaseOutcome::Measured(_) => None,
            })
            .collect();
        if !failures.is_empty() {
            writeln!(f, "Failed cases ({}):", failures.len())?;
            for (case, error) in failures {
                writeln!(f, "  {case}: {error}")?;
            }
        }
        Ok(())
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

impl ResultSink for ComparisonTable {
    fn record(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }
}
