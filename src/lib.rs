//! # quantile-metrics
//!
//! Evaluation of probabilistic quantile forecasts, such as operating reserve
//! requirement estimates, against observed outcomes.
//!
//! Provides seven scalar reserve metrics (coverage, requirement, exceeding,
//! closeness, maximum exceeding, reserve ramp rate and pinball loss), their
//! aggregation into (quantile, fold) tables with optional averaging across
//! cross-validation folds, and detection of quantile crossings.

pub mod core;
pub mod error;
pub mod evaluation;
pub mod metrics;

pub use error::{EvalError, Result};

pub mod prelude {
    pub use crate::core::{FoldColumn, FoldId, PredictionTable, Quantile, TimeSeries};
    pub use crate::error::{EvalError, Result};
    pub use crate::evaluation::{
        compute_metrics_for_all_quantiles, compute_metrics_for_quantile, count_crossings,
        CrossingTable, EvalConfig, FoldMetricTable, MetricReport, MetricTable, QuantileMetricTable,
    };
    pub use crate::metrics::Metric;
}
