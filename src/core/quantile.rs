//! Quantile levels and the composite keys built from them.

use crate::error::{EvalError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Cross-validation fold identifier.
pub type FoldId = usize;

/// A target quantile level τ in the open interval (0, 1).
///
/// Ordered by value so it can key ordered maps.
#[derive(Debug, Clone, Copy)]
pub struct Quantile(f64);

impl Quantile {
    pub fn new(tau: f64) -> Result<Self> {
        if tau.is_finite() && tau > 0.0 && tau < 1.0 {
            Ok(Self(tau))
        } else {
            Err(EvalError::InvalidParameter(format!(
                "quantile must lie in (0, 1), got {tau}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Quantile {
    type Error = EvalError;

    fn try_from(tau: f64) -> Result<Self> {
        Self::new(tau)
    }
}

impl From<Quantile> for f64 {
    fn from(q: Quantile) -> f64 {
        q.0
    }
}

impl PartialEq for Quantile {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Quantile {}

impl PartialOrd for Quantile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Quantile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Quantile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Two-level column key: (quantile, fold).
///
/// Ordered by quantile first, then fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FoldColumn {
    pub quantile: Quantile,
    pub fold: FoldId,
}

impl FoldColumn {
    pub fn new(quantile: Quantile, fold: FoldId) -> Self {
        Self { quantile, fold }
    }
}

impl fmt::Display for FoldColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.quantile, self.fold)
    }
}
