//! Reserve forecast metrics.
//!
//! The seven metric functions live in [`functions`]; [`Metric`] names them so
//! a metric list can be stored, ordered and used as table row labels.

pub mod functions;

pub use functions::{
    closeness, coverage, exceeding, max_exceeding, pinball_loss, requirement,
    reserve_ramp_rate, DEFAULT_PINBALL_TAU,
};

use crate::core::TimeSeries;
use crate::error::{EvalError, Result};
use std::fmt;
use std::str::FromStr;

/// A scalar metric computed from an (observed, predicted) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Coverage,
    Requirement,
    Exceeding,
    Closeness,
    MaxExceeding,
    ReserveRampRate,
    PinballLoss,
}

impl Metric {
    /// Every metric, in the default reporting order.
    pub const ALL: [Metric; 7] = [
        Metric::Coverage,
        Metric::Requirement,
        Metric::Exceeding,
        Metric::Closeness,
        Metric::MaxExceeding,
        Metric::ReserveRampRate,
        Metric::PinballLoss,
    ];

    /// Row label used in result tables.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Coverage => "coverage",
            Metric::Requirement => "requirement",
            Metric::Exceeding => "exceeding",
            Metric::Closeness => "closeness",
            Metric::MaxExceeding => "max_exceeding",
            Metric::ReserveRampRate => "reserve_ramp_rate",
            Metric::PinballLoss => "pinball_loss",
        }
    }

    /// Evaluate the metric. `tau` is only read by [`Metric::PinballLoss`].
    pub fn evaluate(self, observed: &TimeSeries, predicted: &TimeSeries, tau: f64) -> Result<f64> {
        match self {
            Metric::Coverage => coverage(observed, predicted),
            Metric::Requirement => requirement(observed, predicted),
            Metric::Exceeding => exceeding(observed, predicted),
            Metric::Closeness => closeness(observed, predicted),
            Metric::MaxExceeding => max_exceeding(observed, predicted),
            Metric::ReserveRampRate => reserve_ramp_rate(observed, predicted),
            Metric::PinballLoss => pinball_loss(observed, predicted, tau),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s.trim().to_lowercase())
            .ok_or_else(|| {
                EvalError::InvalidParameter(format!(
                    "unknown metric: {s}. Valid options: {}",
                    Metric::ALL.map(Metric::name).join(", ")
                ))
            })
    }
}
