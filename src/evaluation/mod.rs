//! Aggregation of reserve metrics over folds and quantiles, and quantile
//! crossing detection.

pub mod aggregate;
pub mod config;
pub mod crossing;
pub mod table;

pub use aggregate::{
    compute_metrics_for_all_quantiles, compute_metrics_for_quantile, MetricReport,
};
pub use config::{EvalConfig, DEFAULT_FOLDS};
pub use crossing::{count_crossings, CrossingTable, QuantilePair};
pub use table::{ColumnKey, FoldMetricTable, MetricTable, QuantileMetricTable};
