//! Time-decay weighted deviation of smoothed price from the model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ModelConstants, Series, MS_PER_YEAR};
use crate::error::{AnalysisError, ValidationError};
use crate::model;

/// Weight half-life control: a sample one year older than the newest one
/// weighs `exp(-0.5)` as much.
pub const DECAY_PER_YEAR: f64 = 0.5;

/// Weighted moments of the historical percentage deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationStats {
    pub weighted_mean_pct: f64,
    pub weighted_std_dev_pct: f64,
    /// `1 / Σwᵢ²` over the normalized weights.
    pub effective_sample_size: f64,
    /// Samples with a usable model price.
    pub sample_count: usize,
}

/// Percentage deviation of `actual` from `model`.
pub fn deviation_pct(actual: f64, model: f64) -> f64 {
    (actual - model) / model * 100.0
}

/// Decay weight of a sample taken at `timestamp_ms` relative to `latest_ms`.
pub fn decay_weight(latest_ms: i64, timestamp_ms: i64) -> f64 {
    let years_between = (latest_ms - timestamp_ms) as f64 / MS_PER_YEAR as f64;
    (-DECAY_PER_YEAR * years_between).exp()
}

/// Analyze `smoothed` against the model over the timestamps of `series`.
///
/// Samples whose model price is undefined or zero are left out entirely,
/// including from weight normalization.
pub fn analyze(
    series: &Series,
    smoothed: &[f64],
    constants: &ModelConstants,
    now_ms: i64,
) -> Result<DeviationStats, AnalysisError> {
    let Some(latest) = series.latest() else {
        return Err(AnalysisError::EmptySeries);
    };
    if smoothed.len() != series.len() {
        return Err(ValidationError::SmoothedLengthMismatch {
            expected: series.len(),
            actual: smoothed.len(),
        }
        .into());
    }

    let latest_ms = latest.timestamp();
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(series.len());
    for (sample, actual) in series.iter().zip(smoothed) {
        let model_price = model::evaluate(sample.timestamp(), constants, now_ms).or_zero();
        if model_price == 0.0 {
            continue;
        }
        points.push((
            deviation_pct(*actual, model_price),
            decay_weight(latest_ms, sample.timestamp()),
        ));
    }

    if points.is_empty() {
        return Err(AnalysisError::NoValidDataPoints);
    }
    let excluded = series.len() - points.len();
    if excluded > 0 {
        debug!(excluded, "samples without a model price left out of deviation");
    }

    let total_weight: f64 = points.iter().map(|(_, weight)| weight).sum();
    for (_, weight) in &mut points {
        *weight /= total_weight;
    }

    let mean: f64 = points.iter().map(|(dev, weight)| weight * dev).sum();
    let variance: f64 = points
        .iter()
        .map(|(dev, weight)| weight * (dev - mean).powi(2))
        .sum();
    let sum_sq_weights: f64 = points.iter().map(|(_, weight)| weight * weight).sum();

    Ok(DeviationStats {
        weighted_mean_pct: mean,
        weighted_std_dev_pct: variance.sqrt(),
        effective_sample_size: 1.0 / sum_sq_weights,
        sample_count: points.len(),
    })
}
