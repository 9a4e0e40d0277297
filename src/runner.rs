//! Sequential execution of an expanded case matrix.

use std::panic::{self, AssertUnwindSafe};

use serde::{Serialize, Serializer};

use crate::case::{build_case, BenchmarkCase, CaseId, CasePlan};
use crate::config::HarnessConfig;
use crate::engine::{panic_message, MeasurementEngine, MeasurementResult};
use crate::error::{CaseFailure, HarnessError, Result};
use crate::matrix::{expand, CaseFilter};

/// What happened to one attempted case.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    Measured(MeasurementResult),
    Failed {
        case: CaseId,
        #[serde(serialize_with = "serialize_display")]
        error: HarnessError,
    },
}

impl CaseOutcome {
    pub fn case(&self) -> &CaseId {
        match self {
            CaseOutcome::Measured(result) => &result.case,
            CaseOutcome::Failed { case, .. } => case,
        }
    }

    pub fn measured(&self) -> Option<&MeasurementResult> {
        match self {
            CaseOutcome::Measured(result) => Some(result),
            CaseOutcome::Failed { .. } => None,
        }
    }
}

fn serialize_display<S: Serializer>(error: &HarnessError, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Receives one outcome per attempted case, in matrix order.
pub trait ResultSink {
    fn record(&mut self, outcome: CaseOutcome);
}

impl ResultSink for Vec<CaseOutcome> {
    fn record(&mut self, outcome: CaseOutcome) {
        self.push(outcome);
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub measured: usize,
    pub failed: usize,
}

/// Validated configuration plus the engine that measures its cases.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn plans(&self, filter: Option<&CaseFilter>) -> Vec<CasePlan> {
        expand(&self.config, filter)
    }

    /// Runs every selected case, one at a time. A failing case is recorded and
    /// the run moves on to the next one.
    pub fn run(&self, filter: Option<&CaseFilter>, sink: &mut dyn ResultSink) -> RunSummary {
        let plans = self.plans(filter);
        tracing::info!(cases = plans.len(), seed = self.config.seed, "starting run");

        let mut engine = MeasurementEngine::new(self.config.measurement.clone());
        let mut summary = RunSummary::default();
        for plan in &plans {
            let outcome = self.run_plan(&mut engine, plan);
            match &outcome {
                CaseOutcome::Measured(result) => {
                    summary.measured += 1;
                    tracing::info!(
                        case = %result.case,
                        mean_ns = result.mean_ns,
                        samples = result.sample_count,
                        "case measured"
                    );
                }
                CaseOutcome::Failed { case, error } => {
                    summary.failed += 1;
                    tracing::warn!(%case, %error, "case failed");
                }
            }
            sink.record(outcome);
        }
        summary
    }

    /// Builds, sets up, and measures a single plan.
    pub fn run_plan(&self, engine: &mut MeasurementEngine, plan: &CasePlan) -> CaseOutcome {
        let prepared = panic::catch_unwind(AssertUnwindSafe(
            || -> Result<Box<dyn BenchmarkCase>> {
                let mut case = build_case(plan)?;
                tracing::debug!(case = %plan.id, "setting up");
                case.setup()?;
                Ok(case)
            },
        ))
        .unwrap_or_else(|payload| {
            Err(HarnessError::CaseExecution {
                case: plan.id.clone(),
                source: CaseFailure::Panicked(panic_message(payload.as_ref())),
            })
        });
        let measured = prepared.and_then(|mut case| engine.run(case.as_mut()));
        match measured {
            Ok(result) => CaseOutcome::Measured(result),
            Err(error) => CaseOutcome::Failed {
                case: plan.id.clone(),
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Operation;
    use crate::config::MeasurementConfig;
    use crate::container::ContainerKind;
    use crate::element::ElementType;

    fn quick() -> MeasurementConfig {
        MeasurementConfig {
            warmup_min_iterations: 1,
            warmup_min_time_ms: 1_000,
            iterations: 3,
            target_time_ms: None,
            trim_fraction: None,
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = HarnessConfig {
            container_kinds: Vec::new(),
            ..HarnessConfig::default()
        };
        assert!(matches!(Harness::new(config), Err(HarnessError::InvalidConfig(_))));
    }

    #[test]
    fn every_attempted_case_is_reported() {
        let config = HarnessConfig {
            element_types: vec![ElementType::ByteKey],
            sizes: vec![16, 300],
            container_kinds: vec![ContainerKind::UnorderedHashMap, ContainerKind::TreeMap],
            measurement: quick(),
            ..HarnessConfig::default()
        };
        let harness = Harness::new(config).unwrap();
        let mut outcomes = Vec::new();
        let summary = harness.run(None, &mut outcomes);

        assert_eq!(outcomes.len(), 2 * 2 * 2);
        assert_eq!(summary, RunSummary { measured: 4, failed: 4 });
        for outcome in &outcomes {
            match outcome {
                CaseOutcome::Measured(result) => assert_eq!(result.case.size, 16),
                CaseOutcome::Failed { case, error } => {
                    assert_eq!(case.size, 300);
                    assert!(matches!(error, HarnessError::GenerationExhausted { .. }));
                }
            }
        }
    }

    #[test]
    fn failures_serialize_with_message() {
        let outcome = CaseOutcome::Failed {
            case: CaseId {
                operation: Operation::TryAdd,
                element: ElementType::ByteKey,
                size: 300,
                kind: ContainerKind::HashSet,
            },
            error: HarnessError::InvalidSize(-1),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["case"]["kind"], "HashSet");
        assert_eq!(json["error"], "invalid size -1: sizes must be non-negative");
    }
}
