//! TimeSeries data structure for observed and predicted values.

use crate::error::{EvalError, Result};
use chrono::{DateTime, Duration, Utc};

const NANOS_PER_HOUR: f64 = 3_600.0 * 1e9;

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Start at `start` and space observations `step` apart.
    pub fn regular(mut self, start: DateTime<Utc>, step: Duration, len: usize) -> Self {
        self.timestamps = (0..len).map(|i| start + step * i as i32).collect();
        self
    }

    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        TimeSeries::new(self.timestamps, self.values)
    }
}

impl TimeSeries {
    /// Create a new TimeSeries.
    ///
    /// Timestamps must be strictly increasing and there must be exactly one
    /// value per timestamp.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if let Some(pos) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(EvalError::TimestampError(format!(
                "timestamps must be strictly increasing (position {})",
                pos + 1
            )));
        }

        if values.len() != timestamps.len() {
            return Err(EvalError::length_mismatch(timestamps.len(), values.len()));
        }

        Ok(Self { timestamps, values })
    }

    pub fn builder() -> TimeSeriesBuilder {
        TimeSeriesBuilder::new()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Create a series sharing this series' index with different values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() != self.len() {
            return Err(EvalError::length_mismatch(self.len(), values.len()));
        }
        Ok(TimeSeries {
            timestamps: self.timestamps.clone(),
            values,
        })
    }

    /// Verify that `other` is indexed by exactly the same timestamps.
    pub fn check_aligned(&self, other: &TimeSeries) -> Result<()> {
        if self.len() != other.len() {
            return Err(EvalError::length_mismatch(self.len(), other.len()));
        }
        if let Some(pos) = self
            .timestamps
            .iter()
            .zip(other.timestamps.iter())
            .position(|(a, b)| a != b)
        {
            return Err(EvalError::ShapeMismatch {
                expected: format!("timestamp {} at position {pos}", self.timestamps[pos]),
                got: format!("timestamp {}", other.timestamps[pos]),
            });
        }
        Ok(())
    }

    /// Elapsed hours between consecutive timestamps.
    ///
    /// Returns `len() - 1` entries, computed from nanosecond deltas.
    pub fn hour_deltas(&self) -> Vec<f64> {
        self.timestamps
            .windows(2)
            .map(|w| duration_hours(w[1] - w[0]))
            .collect()
    }
}

fn duration_hours(delta: Duration) -> f64 {
    let nanos = delta
        .num_nanoseconds()
        .map(|ns| ns as f64)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 * 1e6);
    nanos / NANOS_PER_HOUR
}
