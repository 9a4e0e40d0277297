//! Harness configuration.
//!
//! The core consumes one immutable [`HarnessConfig`] at matrix-expansion time.
//! Callers either start from [`HarnessConfig::default`] or load a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::case::Operation;
use crate::container::ContainerKind;
use crate::element::ElementType;
use crate::error::{HarnessError, Result};

pub const DEFAULT_COLLECTION_SIZE: i64 = 512;
pub const DEFAULT_SEED: u64 = 12345;

/// Selection of cases plus measurement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub element_types: Vec<ElementType>,
    pub sizes: Vec<i64>,
    pub container_kinds: Vec<ContainerKind>,
    pub operations: Vec<Operation>,
    /// Seed shared read-only by every case's value generator.
    pub seed: u64,
    /// Worker threads for the concurrent map's add case; 1 keeps it sequential.
    pub concurrent_workers: usize,
    pub measurement: MeasurementConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            element_types: ElementType::DEFAULT.to_vec(),
            sizes: vec![DEFAULT_COLLECTION_SIZE],
            container_kinds: ContainerKind::ALL.to_vec(),
            operations: vec![Operation::TryAdd, Operation::TryGetValue],
            seed: DEFAULT_SEED,
            concurrent_workers: 1,
            measurement: MeasurementConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |message: String| HarnessError::ConfigLoad {
            path: path.to_path_buf(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| load_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects malformed configurations before any case is built.
    pub fn validate(&self) -> Result<()> {
        if self.element_types.is_empty() {
            return Err(HarnessError::InvalidConfig("no element types selected".into()));
        }
        if self.sizes.is_empty() {
            return Err(HarnessError::InvalidConfig("no sizes selected".into()));
        }
        if let Some(&size) = self.sizes.iter().find(|&&s| s < 0) {
            return Err(HarnessError::InvalidSize(size));
        }
        if self.container_kinds.is_empty() {
            return Err(HarnessError::InvalidConfig("no container kinds selected".into()));
        }
        if self.operations.is_empty() {
            return Err(HarnessError::InvalidConfig("no operations selected".into()));
        }
        if self.concurrent_workers == 0 {
            return Err(HarnessError::InvalidConfig(
                "concurrent_workers must be at least 1".into(),
            ));
        }
        self.measurement.validate()
    }
}

/// Warmup and measurement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeasurementConfig {
    /// Warmup ends after this many iterations...
    pub warmup_min_iterations: u64,
    /// ...or after this much time, whichever comes first.
    pub warmup_min_time_ms: u64,
    /// Number of timed iterations.
    pub iterations: usize,
    /// Stop measuring early once this much time has been spent.
    pub target_time_ms: Option<u64>,
    /// Fraction of samples dropped from each end before summarizing, in `[0, 0.5)`.
    pub trim_fraction: Option<f64>,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            warmup_min_iterations: 3,
            warmup_min_time_ms: 250,
            iterations: 15,
            target_time_ms: None,
            trim_fraction: None,
        }
    }
}

impl MeasurementConfig {
    pub fn warmup_min_time(&self) -> Duration {
        Duration::from_millis(self.warmup_min_time_ms)
    }

    pub fn target_time(&self) -> Option<Duration> {
        self.target_time_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(HarnessError::InvalidConfig("iterations must be at least 1".into()));
        }
        if let Some(fraction) = self.trim_fraction {
            if !(0.0..0.5).contains(&fraction) {
                return Err(HarnessError::InvalidConfig(format!(
                    "trim_fraction {fraction} is outside [0, 0.5)"
                )));
            }
        }
        Ok(())
    }
}
