//! Micro-benchmark harness for container try-add / try-get operations.
//!
//! The same logical benchmark ("insert N unique keys", "look up N existing
//! keys") runs over hash, tree, sorted, concurrent, persistent and set
//! containers, for several element types:
//!
//! 1. [`matrix::expand`] crosses the configured element types, sizes,
//!    container kinds and operations into [`case::CasePlan`]s.
//! 2. [`case::build_case`] turns a plan into a [`case::BenchmarkCase`] whose
//!    setup draws a unique [`generator::InputSet`].
//! 3. [`engine::MeasurementEngine`] warms the case up, times it, and yields a
//!    [`engine::MeasurementResult`].
//! 4. [`runner::Harness`] drives the whole matrix and hands every outcome to a
//!    [`runner::ResultSink`].

pub mod case;
pub mod config;
pub mod container;
pub mod element;
pub mod engine;
pub mod error;
pub mod generator;
pub mod matrix;
pub mod report;
pub mod runner;
pub mod stats;

pub use case::{BenchmarkCase, CaseId, CasePlan, Category, Operation};
pub use config::{HarnessConfig, MeasurementConfig};
pub use container::{Container, ContainerKind};
pub use element::{Element, ElementType, ObjectRecord, ValueRecord};
pub use engine::{MeasurementEngine, MeasurementResult, Phase};
pub use error::{CaseFailure, HarnessError, Result};
pub use generator::{InputSet, ValueGenerator};
pub use matrix::CaseFilter;
pub use runner::{CaseOutcome, Harness, ResultSink, RunSummary};
