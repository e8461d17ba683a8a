//! Metric result tables.
//!
//! A [`MetricTable`] has one row per metric (in metric-list order) and one
//! column per key. Per-fold tables are keyed by [`FoldColumn`]; fold-averaged
//! tables by [`Quantile`].

use crate::core::{FoldColumn, FoldId, Quantile};
use crate::error::Result;
use crate::metrics::Metric;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// A column key with one or more named levels.
pub trait ColumnKey: Ord + Copy + fmt::Debug {
    /// Level names, outermost first.
    const LEVEL_NAMES: &'static [&'static str];

    /// Label of this key at each level, outermost first.
    fn level_labels(&self) -> Vec<String>;
}

impl ColumnKey for FoldColumn {
    const LEVEL_NAMES: &'static [&'static str] = &["Quantiles", "Fold ID"];

    fn level_labels(&self) -> Vec<String> {
        vec![self.quantile.to_string(), self.fold.to_string()]
    }
}

impl ColumnKey for Quantile {
    const LEVEL_NAMES: &'static [&'static str] = &["Quantiles"];

    fn level_labels(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Metrics for every (quantile, fold) column.
pub type FoldMetricTable = MetricTable<FoldColumn>;

/// Metrics averaged across folds, one column per quantile.
pub type QuantileMetricTable = MetricTable<Quantile>;

/// Mean of the non-NaN values; NaN if there are none.
pub(crate) fn nan_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Table of metric values: rows are metrics, columns are keyed by `K`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable<K: ColumnKey> {
    metrics: Vec<Metric>,
    columns: BTreeMap<K, Vec<f64>>,
}

impl<K: ColumnKey> MetricTable<K> {
    /// Create a table with the given row labels and no columns.
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self {
            metrics,
            columns: BTreeMap::new(),
        }
    }

    /// Row labels, in order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column keys, ascending.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.columns.keys().copied()
    }

    /// All values of one column, in row order.
    pub fn column(&self, key: K) -> Option<&[f64]> {
        self.columns.get(&key).map(|v| v.as_slice())
    }

    /// Single cell lookup.
    pub fn get(&self, metric: Metric, key: K) -> Option<f64> {
        let row = self.row_index(metric)?;
        self.columns.get(&key).map(|col| col[row])
    }

    /// One metric across every column, in key order.
    pub fn row(&self, metric: Metric) -> Option<Vec<(K, f64)>> {
        let row = self.row_index(metric)?;
        Some(self.columns.iter().map(|(k, col)| (*k, col[row])).collect())
    }

    /// Mean of one metric over every column, skipping NaN cells.
    pub fn row_mean(&self, metric: Metric) -> Option<f64> {
        let row = self.row_index(metric)?;
        Some(nan_mean(self.columns.values().map(|col| col[row])))
    }

    fn row_index(&self, metric: Metric) -> Option<usize> {
        self.metrics.iter().position(|m| *m == metric)
    }

    /// Insert or replace a column. `values` must follow row order.
    pub(crate) fn insert_column(&mut self, key: K, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.metrics.len());
        self.columns.insert(key, values);
    }

    /// Write the table as comma-separated text.
    ///
    /// One header line per key level (level name, then each column's label),
    /// followed by one line per metric.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        for (level, name) in K::LEVEL_NAMES.iter().enumerate() {
            write!(writer, "{name}")?;
            for key in self.columns.keys() {
                write!(writer, ",{}", key.level_labels()[level])?;
            }
            writeln!(writer)?;
        }
        for (row, metric) in self.metrics.iter().enumerate() {
            write!(writer, "{metric}")?;
            for col in self.columns.values() {
                write!(writer, ",{}", col[row])?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table to a file, replacing it if it exists.
    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))?;
        info!(
            path = %path.display(),
            columns = self.columns.len(),
            "wrote metric table"
        );
        Ok(())
    }
}

impl MetricTable<FoldColumn> {
    /// Distinct quantile levels present, ascending.
    pub fn quantiles(&self) -> Vec<Quantile> {
        let mut out: Vec<Quantile> = self.columns.keys().map(|k| k.quantile).collect();
        out.dedup();
        out
    }

    /// Folds present for one quantile, ascending.
    pub fn folds_for(&self, quantile: Quantile) -> Vec<FoldId> {
        self.columns
            .keys()
            .filter(|k| k.quantile == quantile)
            .map(|k| k.fold)
            .collect()
    }

    /// Drop every column belonging to `quantile`.
    pub(crate) fn remove_quantile(&mut self, quantile: Quantile) {
        self.columns.retain(|key, _| key.quantile != quantile);
    }

    /// Collapse the fold level by averaging each (metric, quantile) across
    /// its folds. NaN cells are skipped; a quantile whose folds are all NaN
    /// for a metric stays NaN.
    pub fn average_across_folds(&self) -> MetricTable<Quantile> {
        let mut grouped: BTreeMap<Quantile, Vec<&Vec<f64>>> = BTreeMap::new();
        for (key, col) in &self.columns {
            grouped.entry(key.quantile).or_default().push(col);
        }

        let mut averaged = MetricTable::new(self.metrics.clone());
        for (quantile, cols) in grouped {
            let means = (0..self.metrics.len())
                .map(|row| nan_mean(cols.iter().map(|col| col[row])))
                .collect();
            averaged.insert_column(quantile, means);
        }
        averaged
    }
}

const LABEL_WIDTH: usize = 12;

impl<K: ColumnKey> fmt::Display for MetricTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .metrics
            .iter()
            .map(|m| m.name().len())
            .chain(K::LEVEL_NAMES.iter().map(|n| n.len()))
            .max()
            .unwrap_or(0);

        for (level, name) in K::LEVEL_NAMES.iter().enumerate() {
            write!(f, "{name:<name_width$}")?;
            for key in self.columns.keys() {
                write!(f, " {:>width$}", key.level_labels()[level], width = LABEL_WIDTH)?;
            }
            writeln!(f)?;
        }
        for (row, metric) in self.metrics.iter().enumerate() {
            write!(f, "{:<name_width$}", metric.name())?;
            for col in self.columns.values() {
                write!(f, " {:>width$.4}", col[row], width = LABEL_WIDTH)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn q(tau: f64) -> Quantile {
        Quantile::new(tau).unwrap()
    }

    fn sample() -> FoldMetricTable {
        let mut table = MetricTable::new(vec![Metric::Coverage, Metric::Exceeding]);
        table.insert_column(FoldColumn::new(q(0.95), 0), vec![0.9, f64::NAN]);
        table.insert_column(FoldColumn::new(q(0.95), 1), vec![1.0, 4.0]);
        table.insert_column(FoldColumn::new(q(0.5), 0), vec![0.4, 2.0]);
        table.insert_column(FoldColumn::new(q(0.5), 1), vec![0.6, 3.0]);
        table
    }

    #[test]
    fn lookups() {
        let table = sample();
        assert_eq!(table.n_columns(), 4);
        assert_eq!(
            table.get(Metric::Coverage, FoldColumn::new(q(0.95), 1)),
            Some(1.0)
        );
        assert_eq!(table.get(Metric::Closeness, FoldColumn::new(q(0.95), 1)), None);
        assert_eq!(table.quantiles(), vec![q(0.5), q(0.95)]);
        assert_eq!(table.folds_for(q(0.95)), vec![0, 1]);

        let row = table.row(Metric::Coverage).unwrap();
        assert_eq!(row[0], (FoldColumn::new(q(0.5), 0), 0.4));
    }

    #[test]
    fn row_mean_skips_nan() {
        let table = sample();
        assert_relative_eq!(table.row_mean(Metric::Exceeding).unwrap(), 3.0);
        assert_relative_eq!(
            table.row_mean(Metric::Coverage).unwrap(),
            0.725,
            epsilon = 1e-12
        );
    }

    #[test]
    fn average_across_folds_groups_by_quantile() {
        let avg = sample().average_across_folds();
        assert_eq!(avg.keys().collect::<Vec<_>>(), vec![q(0.5), q(0.95)]);
        assert_relative_eq!(avg.get(Metric::Coverage, q(0.5)).unwrap(), 0.5);
        assert_relative_eq!(
            avg.get(Metric::Coverage, q(0.95)).unwrap(),
            0.95,
            epsilon = 1e-12
        );
        assert_relative_eq!(avg.get(Metric::Exceeding, q(0.95)).unwrap(), 4.0);
    }

    #[test]
    fn average_of_all_nan_is_nan() {
        let mut table = MetricTable::new(vec![Metric::Exceeding]);
        table.insert_column(FoldColumn::new(q(0.9), 0), vec![f64::NAN]);
        table.insert_column(FoldColumn::new(q(0.9), 1), vec![f64::NAN]);
        let avg = table.average_across_folds();
        assert!(avg.get(Metric::Exceeding, q(0.9)).unwrap().is_nan());
    }

    #[test]
    fn csv_has_one_header_line_per_level() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Quantiles,0.5,0.5,0.95,0.95");
        assert_eq!(lines[1], "Fold ID,0,1,0,1");
        assert_eq!(lines[2], "coverage,0.4,0.6,0.9,1");
        assert_eq!(lines[3], "exceeding,2,3,NaN,4");
        assert_eq!(lines.len(), 4);

        let mut buf = Vec::new();
        sample().average_across_folds().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Quantiles,0.5,0.95\ncoverage,"));
    }

    #[test]
    fn display_lists_every_metric() {
        let rendered = sample().to_string();
        assert!(rendered.starts_with("Quantiles"));
        assert!(rendered.contains("Fold ID"));
        assert!(rendered.contains("coverage"));
        assert!(rendered.contains("exceeding"));
    }
}
