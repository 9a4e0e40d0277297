//! Warmup / measurement protocol for a single case.

use std::any::Any;
use std::hint::black_box;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::Serialize;

use crate::case::{BenchmarkCase, CaseId};
use crate::config::MeasurementConfig;
use crate::error::{CaseFailure, HarnessError, Result};
use crate::stats::Samples;

/// Where the engine is in its protocol for the current case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Warmup,
    Measuring,
    Done,
}

/// Timing statistics for one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    #[serde(flatten)]
    pub case: CaseId,
    pub mean_ns: f64,
    pub stddev_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub ns_per_element: f64,
    /// Samples the statistics were computed over, after trimming.
    pub sample_count: usize,
    /// Timed iterations actually run.
    pub measured_iterations: usize,
    pub warmup_iterations: u64,
    /// Fraction dropped from each tail; `None` means untrimmed statistics.
    pub trimmed_fraction: Option<f64>,
}

/// Runs cases through `Idle → Warmup → Measuring → Done`.
#[derive(Debug)]
pub struct MeasurementEngine {
    config: MeasurementConfig,
    phase: Phase,
}

impl MeasurementEngine {
    pub fn new(config: MeasurementConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Measures a case whose setup has completed.
    ///
    /// A failure or panic in the timed closure aborts the case with
    /// [`HarnessError::CaseExecution`] and returns the engine to `Idle`.
    pub fn run(&mut self, case: &mut dyn BenchmarkCase) -> Result<MeasurementResult> {
        let id = case.id().clone();
        self.phase = Phase::Idle;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.drive(case)));
        let (samples, warmup_iterations) = match outcome {
            Ok(Ok(done)) => done,
            Ok(Err(source)) => {
                self.phase = Phase::Idle;
                return Err(HarnessError::CaseExecution { case: id, source });
            }
            Err(payload) => {
                self.phase = Phase::Idle;
                return Err(HarnessError::CaseExecution {
                    case: id,
                    source: CaseFailure::Panicked(panic_message(payload.as_ref())),
                });
            }
        };

        let trim = self.config.trim_fraction;
        let summary = samples.summarize(trim);
        self.transition(Phase::Done, &id);

        let elements = usize::try_from(id.size).unwrap_or(0);
        Ok(MeasurementResult {
            mean_ns: summary.mean_ns,
            stddev_ns: summary.stddev_ns,
            min_ns: summary.min_ns,
            max_ns: summary.max_ns,
            ns_per_element: summary.ns_per_op(elements),
            sample_count: summary.count,
            measured_iterations: samples.len(),
            warmup_iterations,
            trimmed_fraction: trim,
            case: id,
        })
    }

    fn drive(
        &mut self,
        case: &mut dyn BenchmarkCase,
    ) -> std::result::Result<(Samples, u64), CaseFailure> {
        let id = case.id().clone();

        self.transition(Phase::Warmup, &id);
        let min_time = self.config.warmup_min_time();
        let warmup_started = Instant::now();
        let mut warmup_iterations = 0u64;
        while warmup_iterations < self.config.warmup_min_iterations
            && warmup_started.elapsed() < min_time
        {
            case.reset();
            black_box(case.run())?;
            warmup_iterations += 1;
        }

        self.transition(Phase::Measuring, &id);
        let target = self.config.target_time();
        let mut samples = Samples::with_capacity(self.config.iterations);
        let measure_started = Instant::now();
        while samples.len() < self.config.iterations {
            if let Some(target) = target {
                if !samples.is_empty() && measure_started.elapsed() >= target {
                    break;
                }
            }
            case.reset();
            let start = Instant::now();
            let outcome = case.run();
            let elapsed = start.elapsed();
            outcome?;
            samples.add(elapsed);
        }
        case.reset();

        Ok((samples, warmup_iterations))
    }

    fn transition(&mut self, next: Phase, id: &CaseId) {
        tracing::trace!(case = %id, from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
