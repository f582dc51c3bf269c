//! Diagnostic side channel for the intrinsic-dimension estimator.
//!
//! The TwoNN estimator reports its intermediate sequences to a
//! [`DiagnosticObserver`]. Observers only watch: whatever they do, the
//! returned estimate is the same. Plotting front-ends implement the trait or
//! consume a [`RecordingObserver`] after the call.

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Receives intermediate TwoNN sequences.
///
/// All methods default to doing nothing.
pub trait DiagnosticObserver {
    /// Called once with every distance ratio sorted ascending and the number
    /// of leading entries dropped as degenerate.
    fn on_sorted_ratios(&mut self, _sorted_mu: &[f64], _removed: usize) {}

    /// Called once with the regression inputs: `log(mu)` and
    /// `-log(1 - F_emp)`.
    fn on_regression(&mut self, _log_mu: &[f64], _neg_log_survival: &[f64]) {}

    /// Called once with the final estimate.
    fn on_dimension(&mut self, _dimension: f64) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DiagnosticObserver for NoopObserver {}

/// Observer that writes a summary of each stage to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl DiagnosticObserver for LogObserver {
    fn on_sorted_ratios(&mut self, sorted_mu: &[f64], removed: usize) {
        debug!(
            "twonn: removed {removed} of {} points as degenerate",
            sorted_mu.len()
        );
    }

    fn on_regression(&mut self, log_mu: &[f64], _neg_log_survival: &[f64]) {
        debug!("twonn: {} regression points", log_mu.len());
    }

    fn on_dimension(&mut self, dimension: f64) {
        debug!("twonn: dimension {dimension:.4}");
    }
}

/// Observer that keeps a copy of every sequence for later inspection.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordingObserver {
    /// All distance ratios, sorted ascending, degenerate ones included.
    pub sorted_mu: Vec<f64>,

    /// Number of leading degenerate ratios.
    pub removed: usize,

    /// Regression abscissae, `log(mu)`.
    pub log_mu: Vec<f64>,

    /// Regression ordinates, `-log(1 - F_emp)`.
    pub neg_log_survival: Vec<f64>,

    /// Final estimate, if the estimator got that far.
    pub dimension: Option<f64>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ratios that survived the degeneracy filter.
    #[must_use]
    pub fn kept_mu(&self) -> &[f64] {
        &self.sorted_mu[self.removed.min(self.sorted_mu.len())..]
    }
}

impl DiagnosticObserver for RecordingObserver {
    fn on_sorted_ratios(&mut self, sorted_mu: &[f64], removed: usize) {
        self.sorted_mu = sorted_mu.to_vec();
        self.removed = removed;
    }

    fn on_regression(&mut self, log_mu: &[f64], neg_log_survival: &[f64]) {
        self.log_mu = log_mu.to_vec();
        self.neg_log_survival = neg_log_survival.to_vec();
    }

    fn on_dimension(&mut self, dimension: f64) {
        self.dimension = Some(dimension);
    }
}
