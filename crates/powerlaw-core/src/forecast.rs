//! Forward price projection with deviation-derived confidence bands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::deviation::{self, DeviationStats};
use crate::domain::{ModelConstants, Series, UtcDateTime, DEFAULT_CONFIDENCE_LABEL};
use crate::error::{ForecastError, ValidationError};
use crate::model;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Band of `z` standard deviations around the mean deviation, applied to
    /// `base`. Lower is floored at 0 and upper at lower.
    pub fn around(base: f64, stats: &DeviationStats, z_score: f64) -> Self {
        let spread = z_score * stats.weighted_std_dev_pct;
        let lower = (base * (1.0 + (stats.weighted_mean_pct - spread) / 100.0)).max(0.0);
        let upper = (base * (1.0 + (stats.weighted_mean_pct + spread) / 100.0)).max(lower);
        Self { lower, upper }
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMetadata {
    pub target_year: i32,
    /// January 1st 00:00 UTC of the target year, epoch milliseconds.
    pub target_timestamp: i64,
    pub generated_at: UtcDateTime,
    pub sample_count: usize,
    pub smoothing_window: usize,
    /// Label of the interval copied into `lowerBound`/`upperBound`.
    pub default_confidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub base_projection: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence_intervals: BTreeMap<String, ConfidenceInterval>,
    pub historical_deviation: DeviationStats,
    pub metadata: ForecastMetadata,
}

/// Check `year` against the forecast window and return its January 1st
/// timestamp.
///
/// Runs before any data is fetched.
pub fn validate_year(
    year: i32,
    constants: &ModelConstants,
    now: UtcDateTime,
) -> Result<i64, ForecastError> {
    let current_year = now.year();
    if year < current_year {
        return Err(ForecastError::PastYearRequested { year, current_year });
    }

    let max_year = current_year.saturating_add(
        i32::try_from(constants.max_forecast_years).unwrap_or(i32::MAX),
    );
    if year > max_year {
        return Err(ForecastError::HorizonExceeded { year, max_year });
    }

    // Years the calendar cannot represent are past any usable horizon.
    UtcDateTime::start_of_year(year)
        .map(UtcDateTime::unix_millis)
        .map_err(|_| ForecastError::HorizonExceeded { year, max_year })
}

/// Project the model price at January 1st of `year` and wrap it in one
/// confidence interval per configured level.
pub fn forecast(
    year: i32,
    series: &Series,
    smoothed: &[f64],
    smoothing_window: usize,
    constants: &ModelConstants,
    now: UtcDateTime,
) -> Result<ForecastResult, ForecastError> {
    let target_timestamp = validate_year(year, constants, now)?;
    let now_ms = now.unix_millis();

    let base_projection = match model::price_at(target_timestamp, constants, now_ms) {
        Ok(price) if price > 0.0 => price,
        Ok(_) => return Err(ForecastError::InvalidProjection { year, cause: None }),
        Err(error) => {
            return Err(ForecastError::InvalidProjection {
                year,
                cause: Some(error),
            })
        }
    };

    let stats = deviation::analyze(series, smoothed, constants, now_ms)?;

    let confidence_intervals: BTreeMap<String, ConfidenceInterval> = constants
        .levels_by_width()
        .into_iter()
        .map(|(label, z_score)| {
            (
                label.to_owned(),
                ConfidenceInterval::around(base_projection, &stats, z_score),
            )
        })
        .collect();

    let (default_confidence, default_interval) = default_interval(constants, &confidence_intervals)
        .ok_or(ValidationError::EmptyConfidenceLevels)?;

    info!(
        year,
        base_projection,
        sample_count = stats.sample_count,
        "forecast computed"
    );

    Ok(ForecastResult {
        base_projection,
        lower_bound: default_interval.lower,
        upper_bound: default_interval.upper,
        confidence_intervals,
        historical_deviation: stats,
        metadata: ForecastMetadata {
            target_year: year,
            target_timestamp,
            generated_at: now,
            sample_count: stats.sample_count,
            smoothing_window,
            default_confidence,
        },
    })
}

/// The "90" interval when configured, otherwise the narrowest one.
fn default_interval(
    constants: &ModelConstants,
    intervals: &BTreeMap<String, ConfidenceInterval>,
) -> Option<(String, ConfidenceInterval)> {
    if let Some(interval) = intervals.get(DEFAULT_CONFIDENCE_LABEL) {
        return Some((DEFAULT_CONFIDENCE_LABEL.to_owned(), *interval));
    }
    let (label, _) = constants.levels_by_width().into_iter().next()?;
    intervals
        .get(label)
        .map(|interval| (label.to_owned(), *interval))
}
