//! Fold and quantile aggregation of reserve metrics.

use crate::core::{FoldColumn, PredictionTable, Quantile, TimeSeries};
use crate::error::{EvalError, Result};
use crate::evaluation::config::EvalConfig;
use crate::evaluation::table::{FoldMetricTable, MetricTable, QuantileMetricTable};
use std::io::Write;
use std::path::Path;
use tracing::{debug, trace};

/// Result of aggregating every quantile in a prediction table.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricReport {
    /// One column per (quantile, fold).
    PerFold(FoldMetricTable),
    /// One column per quantile, averaged across folds.
    Averaged(QuantileMetricTable),
}

impl MetricReport {
    pub fn per_fold(&self) -> Option<&FoldMetricTable> {
        match self {
            MetricReport::PerFold(table) => Some(table),
            MetricReport::Averaged(_) => None,
        }
    }

    pub fn averaged(&self) -> Option<&QuantileMetricTable> {
        match self {
            MetricReport::Averaged(table) => Some(table),
            MetricReport::PerFold(_) => None,
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        match self {
            MetricReport::PerFold(table) => table.write_csv(writer),
            MetricReport::Averaged(table) => table.write_csv(writer),
        }
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        match self {
            MetricReport::PerFold(table) => table.write_csv_path(path),
            MetricReport::Averaged(table) => table.write_csv_path(path),
        }
    }
}

/// Compute every configured metric for one quantile across all folds.
///
/// `existing` is consumed and returned with this quantile's columns added;
/// columns for other quantiles are left untouched and any columns already
/// present for `tau` are replaced. When `existing` is `None` a fresh table
/// is started. If `config.output` is set the resulting table is also written
/// there.
///
/// # Errors
/// * `MissingFoldData` if a fold in `config.folds` has no prediction for `tau`
/// * `ShapeMismatch` if a prediction is not aligned with `observed`
/// * `InsufficientData` if the series is too short for a metric
/// * `InvalidParameter` if `existing` was built with a different metric list
///
/// `existing` is consumed even on failure: the caller loses the columns it
/// held, so keep a clone if they must survive an error.
///
/// # Example
/// ```
/// use quantile_metrics::core::{PredictionTable, Quantile, TimeSeries};
/// use quantile_metrics::evaluation::{compute_metrics_for_quantile, EvalConfig};
/// use quantile_metrics::metrics::Metric;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let observed = TimeSeries::builder()
///     .regular(start, Duration::hours(1), 3)
///     .values(vec![10.0, 14.0, 10.0])
///     .build()
///     .unwrap();
/// let predictions = PredictionTable::new()
///     .with_series(0.975, 0, observed.with_values(vec![12.0; 3]).unwrap())
///     .unwrap();
///
/// let config = EvalConfig::new().with_folds(1);
/// let tau = Quantile::new(0.975).unwrap();
/// let table = compute_metrics_for_quantile(&observed, &predictions, tau, None, &config).unwrap();
///
/// let exceeding = table.row_mean(Metric::Exceeding).unwrap();
/// assert!((exceeding - 2.0).abs() < 1e-12);
/// ```
pub fn compute_metrics_for_quantile(
    observed: &TimeSeries,
    predictions: &PredictionTable,
    tau: Quantile,
    existing: Option<FoldMetricTable>,
    config: &EvalConfig,
) -> Result<FoldMetricTable> {
    let table = aggregate_quantile(observed, predictions, tau, existing, config)?;
    if let Some(path) = &config.output {
        table.write_csv_path(path)?;
    }
    Ok(table)
}

/// Compute metrics for every quantile present in `predictions`.
///
/// Quantiles are processed in ascending order, threading one table through
/// [`compute_metrics_for_quantile`]. With `config.avg_across_folds` the fold
/// dimension is then averaged away. If `config.output` is set, only the
/// final table is written.
///
/// # Errors
/// `EmptyData` if `predictions` is empty, otherwise any error of
/// [`compute_metrics_for_quantile`]. The first failing quantile aborts the
/// call and no partial table is returned.
pub fn compute_metrics_for_all_quantiles(
    observed: &TimeSeries,
    predictions: &PredictionTable,
    config: &EvalConfig,
) -> Result<MetricReport> {
    let quantiles = predictions.quantiles();
    if quantiles.is_empty() {
        return Err(EvalError::EmptyData);
    }
    debug!(
        quantiles = quantiles.len(),
        avg_across_folds = config.avg_across_folds,
        "aggregating metrics for all quantiles"
    );

    let mut table = None;
    for tau in quantiles {
        table = Some(aggregate_quantile(observed, predictions, tau, table, config)?);
    }
    let table = table.ok_or(EvalError::EmptyData)?;

    let report = if config.avg_across_folds {
        MetricReport::Averaged(table.average_across_folds())
    } else {
        MetricReport::PerFold(table)
    };

    if let Some(path) = &config.output {
        report.write_csv_path(path)?;
    }
    Ok(report)
}

fn aggregate_quantile(
    observed: &TimeSeries,
    predictions: &PredictionTable,
    tau: Quantile,
    existing: Option<FoldMetricTable>,
    config: &EvalConfig,
) -> Result<FoldMetricTable> {
    config.validate()?;

    let mut table = match existing {
        Some(table) if table.metrics() != config.metrics.as_slice() => {
            return Err(EvalError::InvalidParameter(format!(
                "existing table rows {:?} do not match configured metrics {:?}",
                table.metrics(),
                config.metrics
            )));
        }
        Some(table) => table,
        None => MetricTable::new(config.metrics.clone()),
    };

    debug!(tau = %tau, folds = ?config.folds, "computing metrics for quantile");
    table.remove_quantile(tau);

    for fold in config.folds.clone() {
        let predicted = predictions.require(tau, fold)?;
        let mut values = Vec::with_capacity(config.metrics.len());
        for metric in &config.metrics {
            let value = metric.evaluate(observed, predicted, tau.value())?;
            trace!(tau = %tau, fold, metric = metric.name(), value, "metric computed");
            values.push(value);
        }
        table.insert_column(FoldColumn::new(tau, fold), values);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metric;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn observed() -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TimeSeries::builder()
            .regular(base, Duration::hours(1), 4)
            .values(vec![10.0, 14.0, 10.0, 12.0])
            .build()
            .unwrap()
    }

    /// Predictions for each tau: a constant level, shifted by the fold id.
    fn predictions(taus: &[(f64, f64)], n_folds: usize) -> PredictionTable {
        let obs = observed();
        let mut table = PredictionTable::new();
        for &(tau, level) in taus {
            for fold in 0..n_folds {
                let values = vec![level + fold as f64; obs.len()];
                table.insert(
                    Quantile::new(tau).unwrap(),
                    fold,
                    obs.with_values(values).unwrap(),
                );
            }
        }
        table
    }

    fn q(tau: f64) -> Quantile {
        Quantile::new(tau).unwrap()
    }

    #[test]
    fn one_column_per_fold() {
        let preds = predictions(&[(0.975, 12.0)], 3);
        let config = EvalConfig::new().with_folds(3);
        let table = compute_metrics_for_quantile(&observed(), &preds, q(0.975), None, &config)
            .unwrap();

        assert_eq!(table.n_columns(), 3);
        assert_eq!(table.metrics(), Metric::ALL.as_slice());
        assert_relative_eq!(
            table
                .get(Metric::Requirement, FoldColumn::new(q(0.975), 2))
                .unwrap(),
            14.0
        );
        assert_relative_eq!(
            table
                .get(Metric::Coverage, FoldColumn::new(q(0.975), 0))
                .unwrap(),
            0.75
        );
    }

    #[test]
    fn pinball_uses_the_aggregated_tau() {
        let preds = predictions(&[(0.5, 12.0), (0.9, 12.0)], 1);
        let config = EvalConfig::new()
            .with_folds(1)
            .with_metrics(vec![Metric::PinballLoss, Metric::Closeness]);

        let table = compute_metrics_for_quantile(&observed(), &preds, q(0.5), None, &config)
            .unwrap();
        let table =
            compute_metrics_for_quantile(&observed(), &preds, q(0.9), Some(table), &config)
                .unwrap();

        let median = FoldColumn::new(q(0.5), 0);
        assert_relative_eq!(
            table.get(Metric::PinballLoss, median).unwrap(),
            0.5 * table.get(Metric::Closeness, median).unwrap(),
            epsilon = 1e-12
        );
        assert_ne!(
            table.get(Metric::PinballLoss, median),
            table.get(Metric::PinballLoss, FoldColumn::new(q(0.9), 0))
        );
    }

    #[test]
    fn extending_preserves_existing_columns() {
        let preds = predictions(&[(0.95, 11.0), (0.975, 12.0)], 2);
        let config = EvalConfig::new().with_folds(2);

        let first = compute_metrics_for_quantile(&observed(), &preds, q(0.95), None, &config)
            .unwrap();
        let extended = compute_metrics_for_quantile(
            &observed(),
            &preds,
            q(0.975),
            Some(first.clone()),
            &config,
        )
        .unwrap();

        assert_eq!(extended.n_columns(), 4);
        for key in first.keys() {
            assert_eq!(first.column(key), extended.column(key));
        }
    }

    #[test]
    fn rerunning_a_quantile_replaces_all_its_folds() {
        let preds = predictions(&[(0.9, 12.0), (0.5, 8.0)], 3);
        let wide = EvalConfig::new().with_folds(3);
        let table =
            compute_metrics_for_quantile(&observed(), &preds, q(0.5), None, &wide).unwrap();
        let table =
            compute_metrics_for_quantile(&observed(), &preds, q(0.9), Some(table), &wide).unwrap();
        assert_eq!(table.folds_for(q(0.9)), vec![0, 1, 2]);

        let narrow = EvalConfig::new().with_folds(1);
        let table =
            compute_metrics_for_quantile(&observed(), &preds, q(0.9), Some(table), &narrow)
                .unwrap();

        assert_eq!(table.folds_for(q(0.9)), vec![0]);
        assert_eq!(table.folds_for(q(0.5)), vec![0, 1, 2]);
        let avg = table.average_across_folds();
        assert_relative_eq!(avg.get(Metric::Requirement, q(0.9)).unwrap(), 12.0);
        assert_relative_eq!(avg.get(Metric::Requirement, q(0.5)).unwrap(), 9.0);
    }

    #[test]
    fn missing_fold_is_reported() {
        let preds = predictions(&[(0.975, 12.0)], 3);
        let result = compute_metrics_for_quantile(
            &observed(),
            &preds,
            q(0.975),
            None,
            &EvalConfig::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            EvalError::MissingFoldData {
                quantile: 0.975,
                fold: 3
            }
        );
    }

    #[test]
    fn mismatched_existing_rows_are_rejected() {
        let preds = predictions(&[(0.975, 12.0)], 1);
        let config = EvalConfig::new().with_folds(1);
        let existing = MetricTable::new(vec![Metric::Coverage]);

        let result =
            compute_metrics_for_quantile(&observed(), &preds, q(0.975), Some(existing), &config);
        assert!(matches!(result, Err(EvalError::InvalidParameter(_))));
    }

    #[test]
    fn misaligned_prediction_aborts() {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let other = TimeSeries::builder()
            .regular(base, Duration::hours(1), 4)
            .values(vec![1.0; 4])
            .build()
            .unwrap();
        let preds = PredictionTable::new().with_series(0.5, 0, other).unwrap();
        let config = EvalConfig::new().with_folds(1);

        let result = compute_metrics_for_quantile(&observed(), &preds, q(0.5), None, &config);
        assert!(matches!(result, Err(EvalError::ShapeMismatch { .. })));
    }

    #[test]
    fn all_quantiles_per_fold_and_averaged() {
        let preds = predictions(&[(0.95, 11.0), (0.5, 9.0)], 2);
        let per_fold = EvalConfig::new().with_folds(2).with_avg_across_folds(false);

        let report = compute_metrics_for_all_quantiles(&observed(), &preds, &per_fold).unwrap();
        let table = report.per_fold().unwrap();
        assert_eq!(table.n_columns(), 4);
        assert_eq!(table.quantiles(), vec![q(0.5), q(0.95)]);

        let averaged = compute_metrics_for_all_quantiles(
            &observed(),
            &preds,
            &per_fold.clone().with_avg_across_folds(true),
        )
        .unwrap();
        let avg = averaged.averaged().unwrap();
        assert_eq!(avg, &table.average_across_folds());
        // fold 0 requirement 11, fold 1 requirement 12
        assert_relative_eq!(avg.get(Metric::Requirement, q(0.95)).unwrap(), 11.5);
    }

    #[test]
    fn all_quantiles_requires_predictions() {
        let result = compute_metrics_for_all_quantiles(
            &observed(),
            &PredictionTable::new(),
            &EvalConfig::default(),
        );
        assert_eq!(result.unwrap_err(), EvalError::EmptyData);
    }
}
