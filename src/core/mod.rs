//! Core data structures for quantile forecast evaluation.

mod prediction;
mod quantile;
mod time_series;

pub use prediction::PredictionTable;
pub use quantile::{FoldColumn, FoldId, Quantile};
pub use time_series::{TimeSeries, TimeSeriesBuilder};
