use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Label of the interval reported as the headline lower/upper bound pair.
pub const DEFAULT_CONFIDENCE_LABEL: &str = "90";

/// Bitcoin genesis block, 2009-01-03, in epoch milliseconds.
pub const GENESIS_MS: i64 = 1_230_951_600_000;

/// Calibrated power-law parameters plus forecasting tunables.
///
/// Loaded once at startup and passed by reference into every computation;
/// nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConstants {
    /// Base coefficient.
    #[serde(rename = "A")]
    pub a: f64,
    /// Growth exponent.
    #[serde(rename = "B")]
    pub b: f64,
    /// Model origin in epoch milliseconds.
    pub start_date: i64,
    /// Final multiplicative scaling.
    pub scale: f64,
    pub max_forecast_years: u32,
    /// Confidence label (e.g. "95") to z-score.
    pub confidence_levels: BTreeMap<String, f64>,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            a: 0.0058,
            b: 1.84,
            start_date: GENESIS_MS,
            scale: 1.5,
            max_forecast_years: 10,
            confidence_levels: BTreeMap::from([
                (String::from("90"), 1.645),
                (String::from("95"), 1.96),
                (String::from("99"), 2.576),
            ]),
        }
    }
}

impl ModelConstants {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("A", self.a)?;
        validate_positive("B", self.b)?;
        validate_positive("scale", self.scale)?;

        if self.start_date <= 0 {
            return Err(ValidationError::NonPositiveValue {
                field: "start_date",
            });
        }
        if self.max_forecast_years == 0 {
            return Err(ValidationError::NonPositiveValue {
                field: "max_forecast_years",
            });
        }
        if self.confidence_levels.is_empty() {
            return Err(ValidationError::EmptyConfidenceLevels);
        }
        for (label, z_score) in &self.confidence_levels {
            if !z_score.is_finite() || *z_score <= 0.0 {
                return Err(ValidationError::InvalidZScore {
                    label: label.clone(),
                });
            }
        }

        Ok(())
    }

    /// Confidence levels ordered by increasing z-score.
    pub fn levels_by_width(&self) -> Vec<(&str, f64)> {
        let mut levels: Vec<(&str, f64)> = self
            .confidence_levels
            .iter()
            .map(|(label, z)| (label.as_str(), *z))
            .collect();
        levels.sort_by(|left, right| left.1.total_cmp(&right.1));
        levels
    }
}

fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveValue { field });
    }
    Ok(())
}
