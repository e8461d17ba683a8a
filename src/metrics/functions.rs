//! Scalar metrics comparing observed values against quantile estimates.
//!
//! Each function takes the observed series and one aligned prediction series
//! and reduces them to a single `f64`. Sums are accumulated sequentially in
//! `f64`, so results do not depend on evaluation order elsewhere.

use crate::core::TimeSeries;
use crate::error::{EvalError, Result};

/// Default quantile level for [`pinball_loss`].
pub const DEFAULT_PINBALL_TAU: f64 = 0.975;

/// Check alignment and minimum length, returning the value slices.
fn paired<'a>(
    observed: &'a TimeSeries,
    predicted: &'a TimeSeries,
    needed: usize,
) -> Result<(&'a [f64], &'a [f64])> {
    observed.check_aligned(predicted)?;
    if observed.len() < needed {
        return Err(EvalError::InsufficientData {
            needed,
            got: observed.len(),
        });
    }
    Ok((observed.values(), predicted.values()))
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Fraction of observations covered by the estimate (`observed <= predicted`).
pub fn coverage(observed: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    let (obs, pred) = paired(observed, predicted, 1)?;
    let covered = obs.iter().zip(pred).filter(|(o, p)| o <= p).count();
    Ok(covered as f64 / obs.len() as f64)
}

/// Average reserve requirement: the mean of the quantile estimates.
pub fn requirement(observed: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    let (_, pred) = paired(observed, predicted, 1)?;
    Ok(mean_of(pred.iter().copied()))
}

/// Mean excess of observations above the estimate, over exceeding points only.
///
/// Returns NaN when no observation exceeds its estimate.
pub fn exceeding(observed: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    let (obs, pred) = paired(observed, predicted, 1)?;
    Ok(mean_of(
        obs.iter()
            .zip(pred)
            .filter(|(o, p)| o > p)
            .map(|(o, p)| o - p),
    ))
}

/// Mean absolute distance between observations and estimates (MAE).
pub fn closeness(observed: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    let (obs, pred) = paired(observed, predicted, 1)?;
    Ok(mean_of(obs.iter().zip(pred).map(|(o, p)| (o - p).abs())))
}

/// Largest `observed - predicted` over all timestamps. Negative when the
/// estimate always lies above the observation.
pub fn max_exceeding(observed: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    let (obs, pred) = paired(observed, predicted, 1)?;
    Ok(obs
        .iter()
        .zip(pred)
        .map(|(o, p)| o - p)
        .fold(f64::NEG_INFINITY, f64::max))
}

/// Mean absolute rate of change of the estimate, in units per hour.
///
/// Time deltas come from the series' own timestamps, so irregular spacing is
/// handled. Needs at least two points.
pub fn reserve_ramp_rate(observed: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    let (_, pred) = paired(observed, predicted, 2)?;
    let hours = predicted.hour_deltas();
    Ok(mean_of(
        pred.windows(2)
            .zip(hours)
            .map(|(w, dt)| (w[1] - w[0]).abs() / dt),
    ))
}

/// Mean pinball (quantile) loss at level `tau`.
///
/// Per point: `max((1 - tau) * (predicted - observed), tau * (observed - predicted))`.
pub fn pinball_loss(observed: &TimeSeries, predicted: &TimeSeries, tau: f64) -> Result<f64> {
    let (obs, pred) = paired(observed, predicted, 1)?;
    Ok(mean_of(
        obs.iter()
            .zip(pred)
            .map(|(o, p)| ((1.0 - tau) * (p - o)).max(tau * (o - p))),
    ))
}
