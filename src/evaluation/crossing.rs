//! Quantile crossing detection.
//!
//! A crossing is a timestamp where the estimate for a lower quantile level is
//! strictly greater than the estimate for a higher level produced by a model
//! trained on the same fold.

use crate::core::{FoldId, PredictionTable, Quantile};
use crate::error::{EvalError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// An ordered (lower, upper) pair of quantile levels with `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuantilePair {
    pub lower: Quantile,
    pub upper: Quantile,
}

impl QuantilePair {
    pub fn new(lower: Quantile, upper: Quantile) -> Result<Self> {
        if lower < upper {
            Ok(Self { lower, upper })
        } else {
            Err(EvalError::InvalidParameter(format!(
                "lower quantile {lower} must be below upper quantile {upper}"
            )))
        }
    }
}

impl fmt::Display for QuantilePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lower, self.upper)
    }
}

/// Crossing counts: rows are quantile pairs, columns are folds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossingTable {
    folds: Vec<FoldId>,
    counts: BTreeMap<QuantilePair, BTreeMap<FoldId, usize>>,
}

impl CrossingTable {
    pub const LOWER_LABEL: &'static str = "Lower Quantile";
    pub const UPPER_LABEL: &'static str = "Upper Quantile";
    pub const FOLD_LABEL: &'static str = "CV Fold ID";

    /// Folds covered by the table, ascending.
    pub fn folds(&self) -> &[FoldId] {
        &self.folds
    }

    /// Quantile pairs, ascending.
    pub fn pairs(&self) -> impl Iterator<Item = QuantilePair> + '_ {
        self.counts.keys().copied()
    }

    pub fn get(&self, pair: QuantilePair, fold: FoldId) -> Option<usize> {
        self.counts.get(&pair)?.get(&fold).copied()
    }

    /// Crossings for one pair summed over every fold.
    pub fn total_for_pair(&self, pair: QuantilePair) -> Option<usize> {
        self.counts.get(&pair).map(|by_fold| by_fold.values().sum())
    }

    /// Total crossings across the whole table.
    pub fn total(&self) -> usize {
        self.counts.values().flat_map(|by_fold| by_fold.values()).sum()
    }

    /// True when no pair crosses in any fold.
    pub fn is_monotone(&self) -> bool {
        self.total() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Write the table as comma-separated text: a header line naming both
    /// quantile levels and each fold, then one line per pair.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        write!(writer, "{},{}", Self::LOWER_LABEL, Self::UPPER_LABEL)?;
        for fold in &self.folds {
            write!(writer, ",{fold}")?;
        }
        writeln!(writer)?;

        for (pair, by_fold) in &self.counts {
            write!(writer, "{},{}", pair.lower, pair.upper)?;
            for count in by_fold.values() {
                write!(writer, ",{count}")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.write_csv(BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), pairs = self.counts.len(), "wrote crossing table");
        Ok(())
    }
}

impl fmt::Display for CrossingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lw = Self::LOWER_LABEL.len();
        let uw = Self::UPPER_LABEL.len();
        write!(f, "{:>lw$} {:>uw$}", "", Self::FOLD_LABEL)?;
        for fold in &self.folds {
            write!(f, " {fold:>6}")?;
        }
        writeln!(f)?;
        writeln!(f, "{} {}", Self::LOWER_LABEL, Self::UPPER_LABEL)?;
        for (pair, by_fold) in &self.counts {
            write!(f, "{:>lw$} {:>uw$}", pair.lower, pair.upper)?;
            for count in by_fold.values() {
                write!(f, " {count:>6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Count quantile crossings for every fold and every valid quantile pair.
///
/// Quantile levels and folds are taken from `predictions`. For each fold and
/// each pair `t1 < t2`, the count is the number of timestamps where the
/// `(t1, fold)` estimate is strictly greater than the `(t2, fold)` estimate.
///
/// # Errors
/// * `MissingFoldData` if some quantile has no series for a fold that
///   another quantile has
/// * `ShapeMismatch` if two series of the same fold are not aligned
pub fn count_crossings(predictions: &PredictionTable) -> Result<CrossingTable> {
    let quantiles = predictions.quantiles();
    let folds = predictions.folds();
    debug!(
        quantiles = quantiles.len(),
        folds = folds.len(),
        "counting quantile crossings"
    );

    let mut counts: BTreeMap<QuantilePair, BTreeMap<FoldId, usize>> = BTreeMap::new();
    for &fold in &folds {
        for (i, &lower) in quantiles.iter().enumerate() {
            let low = predictions.require(lower, fold)?;
            for &upper in &quantiles[i + 1..] {
                let high = predictions.require(upper, fold)?;
                low.check_aligned(high)?;

                let crossed = low
                    .values()
                    .iter()
                    .zip(high.values())
                    .filter(|(l, h)| l > h)
                    .count();
                if crossed > 0 {
                    debug!(%lower, %upper, fold, crossed, "quantile crossing");
                }
                counts
                    .entry(QuantilePair { lower, upper })
                    .or_default()
                    .insert(fold, crossed);
            }
        }
    }

    Ok(CrossingTable { folds, counts })
}
