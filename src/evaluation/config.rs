//! Configuration for metric aggregation.

use crate::core::FoldId;
use crate::error::{EvalError, Result};
use crate::metrics::Metric;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Number of cross-validation folds evaluated by default.
pub const DEFAULT_FOLDS: usize = 10;

/// Configuration for the metric aggregators.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// Fold identifiers expected for every quantile.
    pub folds: Range<FoldId>,
    /// Metrics to compute, in row order.
    pub metrics: Vec<Metric>,
    /// Collapse the fold dimension when aggregating all quantiles.
    pub avg_across_folds: bool,
    /// Optional destination for the resulting table (delimited text).
    pub output: Option<PathBuf>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            folds: 0..DEFAULT_FOLDS,
            metrics: Metric::ALL.to_vec(),
            avg_across_folds: true,
            output: None,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate folds `0..n_folds`.
    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.folds = 0..n_folds;
        self
    }

    /// Evaluate an arbitrary contiguous fold range.
    pub fn with_fold_range(mut self, folds: Range<FoldId>) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_avg_across_folds(mut self, avg: bool) -> Self {
        self.avg_across_folds = avg;
        self
    }

    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reject configurations that cannot produce a table.
    pub fn validate(&self) -> Result<()> {
        if self.folds.is_empty() {
            return Err(EvalError::InvalidParameter(format!(
                "fold range {:?} is empty",
                self.folds
            )));
        }
        if self.metrics.is_empty() {
            return Err(EvalError::InvalidParameter(
                "at least one metric is required".to_string(),
            ));
        }
        for (i, metric) in self.metrics.iter().enumerate() {
            if self.metrics[..i].contains(metric) {
                return Err(EvalError::InvalidParameter(format!(
                    "metric {metric} listed more than once"
                )));
            }
        }
        Ok(())
    }
}
