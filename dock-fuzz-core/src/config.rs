//! Fuzzer configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::driver::DEFAULT_TEARDOWN_TIMEOUT;
use crate::kind::OperationKind;
use crate::oplog::OperationLogConfig;

/// Relative likelihood of each operation kind. Zero disables a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationWeights {
    weights: Vec<(OperationKind, u32)>,
}

impl Default for OperationWeights {
    fn default() -> Self {
        Self {
            weights: OperationKind::all().iter().map(|kind| (*kind, 1)).collect(),
        }
    }
}

impl OperationWeights {
    /// Every kind at weight zero
    pub fn none() -> Self {
        Self {
            weights: OperationKind::all().iter().map(|kind| (*kind, 0)).collect(),
        }
    }

    pub fn with(mut self, kind: OperationKind, weight: u32) -> Self {
        self.set(kind, weight);
        self
    }

    /// Set one kind's weight. Sentinel kinds are ignored.
    pub fn set(&mut self, kind: OperationKind, weight: u32) {
        if let Some(entry) = self.weights.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = weight;
        }
    }

    pub fn get(&self, kind: OperationKind) -> u32 {
        self.weights
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    /// Kinds with a non-zero weight, in code order
    pub fn enabled(&self) -> impl Iterator<Item = (OperationKind, u32)> + '_ {
        self.weights.iter().copied().filter(|(_, w)| *w > 0)
    }

    pub fn total(&self) -> u64 {
        self.weights.iter().map(|(_, w)| u64::from(*w)).sum()
    }
}

/// Everything that shapes a fuzz campaign
#[derive(Debug, Clone)]
pub struct FuzzerConfig {
    /// PRNG seed; drawn from the OS when unset
    pub seed: Option<u64>,
    /// Number of independent tests
    pub tests: usize,
    pub operations_per_test: usize,
    pub max_main_windows: usize,
    pub max_dock_widgets: usize,
    pub teardown_timeout: Duration,
    pub weights: OperationWeights,
    /// Probability that a generated add-dock-widget starts hidden
    pub start_hidden_ratio: f64,
    /// Where failing runs are written; nothing is written when unset
    pub dump_dir: Option<PathBuf>,
    pub log: OperationLogConfig,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tests: 10,
            operations_per_test: 50,
            max_main_windows: 2,
            max_dock_widgets: 8,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            weights: OperationWeights::default(),
            start_hidden_ratio: 0.1,
            dump_dir: None,
            log: OperationLogConfig::default(),
        }
    }
}

impl FuzzerConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tests(mut self, tests: usize) -> Self {
        self.tests = tests;
        self
    }

    pub fn with_operations_per_test(mut self, operations: usize) -> Self {
        self.operations_per_test = operations;
        self
    }

    /// Clamped to at least one
    pub fn with_max_main_windows(mut self, max: usize) -> Self {
        self.max_main_windows = max.max(1);
        self
    }

    /// Clamped to at least one
    pub fn with_max_dock_widgets(mut self, max: usize) -> Self {
        self.max_dock_widgets = max.max(1);
        self
    }

    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    pub fn with_weights(mut self, weights: OperationWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Clamped to `0.0..=1.0`, NaN reads as `0.0`
    pub fn with_start_hidden_ratio(mut self, ratio: f64) -> Self {
        self.start_hidden_ratio = unit_ratio(ratio);
        self
    }

    /// `start_hidden_ratio` as a usable probability
    pub fn start_hidden_probability(&self) -> f64 {
        unit_ratio(self.start_hidden_ratio)
    }

    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    pub fn with_log(mut self, log: OperationLogConfig) -> Self {
        self.log = log;
        self
    }
}

fn unit_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}
