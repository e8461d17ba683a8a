//! Model-produced quantile estimates keyed by (quantile, fold).

use crate::core::quantile::{FoldColumn, FoldId, Quantile};
use crate::core::TimeSeries;
use crate::error::{EvalError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Prediction series for every (quantile, fold) pair produced by a model.
///
/// Every series is expected to share the timestamp index of the observed
/// series it is evaluated against. That is checked when the series is used,
/// not on insertion.
#[derive(Debug, Clone, Default)]
pub struct PredictionTable {
    series: BTreeMap<FoldColumn, TimeSeries>,
}

impl PredictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the series for `(quantile, fold)`, returning any series it replaces.
    pub fn insert(
        &mut self,
        quantile: Quantile,
        fold: FoldId,
        series: TimeSeries,
    ) -> Option<TimeSeries> {
        self.series.insert(FoldColumn::new(quantile, fold), series)
    }

    /// Builder-style [`insert`](Self::insert) taking a raw τ.
    pub fn with_series(mut self, tau: f64, fold: FoldId, series: TimeSeries) -> Result<Self> {
        self.insert(Quantile::new(tau)?, fold, series);
        Ok(self)
    }

    pub fn get(&self, quantile: Quantile, fold: FoldId) -> Option<&TimeSeries> {
        self.series.get(&FoldColumn::new(quantile, fold))
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn require(&self, quantile: Quantile, fold: FoldId) -> Result<&TimeSeries> {
        self.get(quantile, fold)
            .ok_or(EvalError::MissingFoldData {
                quantile: quantile.value(),
                fold,
            })
    }

    /// Distinct quantile levels present, ascending.
    pub fn quantiles(&self) -> Vec<Quantile> {
        // keys are sorted by quantile first, so dedup of adjacent entries suffices
        let mut out: Vec<Quantile> = self.series.keys().map(|k| k.quantile).collect();
        out.dedup();
        out
    }

    /// Distinct fold identifiers present, ascending.
    pub fn folds(&self) -> Vec<FoldId> {
        self.series
            .keys()
            .map(|k| k.fold)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
