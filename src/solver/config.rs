//! Solver configuration.

use super::{
    DEFAULT_MAX_TIME_POINTS, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SPARSE_THRESHOLD,
    DEFAULT_ZERO_TOLERANCE,
};

/// Configuration shared by all analyses of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Systems with this many or more unknowns use sparse LU.
    pub sparse_threshold: usize,
    /// Transient progress is logged every this many percent.
    pub progress_interval: usize,
    /// Relative size below which symbolic coefficients are treated as zero.
    pub zero_tolerance: f64,
    /// Upper bound on the time points a transient run may store.
    pub max_time_points: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sparse_threshold: DEFAULT_SPARSE_THRESHOLD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            zero_tolerance: DEFAULT_ZERO_TOLERANCE,
            max_time_points: DEFAULT_MAX_TIME_POINTS,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size at which the sparse solver takes over.
    pub fn with_sparse_threshold(mut self, sparse_threshold: usize) -> Self {
        self.sparse_threshold = sparse_threshold;
        self
    }

    /// Set the transient progress logging interval (in percent, 0 disables).
    pub fn with_progress_interval(mut self, progress_interval: usize) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    /// Set the symbolic zero tolerance.
    ///
    /// Symbolic elimination uses floating-point coefficients; terms smaller
    /// than this fraction of the largest coefficient are dropped.
    pub fn with_zero_tolerance(mut self, zero_tolerance: f64) -> Self {
        self.zero_tolerance = zero_tolerance;
        self
    }

    /// Set the largest number of time points a transient run may store.
    pub fn with_max_time_points(mut self, max_time_points: usize) -> Self {
        self.max_time_points = max_time_points;
        self
    }
}
