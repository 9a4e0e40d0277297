//! Error types for the harness.

use std::path::PathBuf;

use crate::case::CaseId;
use crate::container::ContainerKind;
use crate::element::ElementType;

/// Errors produced while configuring, setting up, or measuring cases.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A requested size was negative.
    #[error("invalid size {0}: sizes must be non-negative")]
    InvalidSize(i64),

    /// The uniqueness constraint cannot be met for the requested count.
    #[error("cannot generate {requested} unique {element} values: {reason}")]
    GenerationExhausted {
        element: ElementType,
        requested: usize,
        reason: String,
    },

    /// The container kind needs a capability the element type lacks.
    #[error("{kind} cannot hold {element}: element type has no total order")]
    UnsupportedCombination {
        element: ElementType,
        kind: ContainerKind,
    },

    /// The timed closure failed during warmup or measurement.
    #[error("case {case} failed: {source}")]
    CaseExecution {
        case: CaseId,
        #[source]
        source: CaseFailure,
    },

    /// The configuration record is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read or parsed.
    #[error("failed to load configuration from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },
}

/// Failures raised by a case's timed closure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaseFailure {
    /// `run` was called before `setup` completed.
    #[error("case was run before setup")]
    NotSetUp,

    /// Fewer insertions succeeded than there were unique inputs.
    #[error("expected {expected} insertions, {actual} succeeded")]
    DuplicateInsert { expected: usize, actual: usize },

    /// Some keys that were inserted during setup could not be found.
    #[error("expected {expected} hits, found {actual}")]
    MissingKeys { expected: usize, actual: usize },

    /// The closure panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
