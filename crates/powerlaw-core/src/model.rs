//! Closed-form power-law valuation `price = A * days^B * scale`.

use crate::domain::{ModelConstants, MS_PER_DAY, MS_PER_YEAR};
use crate::error::ModelError;

/// Result of evaluating the model at one timestamp.
///
/// `Invalid` keeps the reason the model declined; callers that need the
/// legacy numeric contract convert it with [`ModelPrice::or_zero`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelPrice {
    Valid(f64),
    Invalid(ModelError),
}

impl ModelPrice {
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Valid(price) => Some(price),
            Self::Invalid(_) => None,
        }
    }

    /// Legacy contract: an undefined model price is reported as 0.
    pub const fn or_zero(self) -> f64 {
        match self {
            Self::Valid(price) => price,
            Self::Invalid(_) => 0.0,
        }
    }

    /// A positive, finite price usable as a deviation denominator.
    pub fn usable(self) -> Option<f64> {
        self.value().filter(|price| *price > 0.0)
    }
}

impl From<Result<f64, ModelError>> for ModelPrice {
    fn from(result: Result<f64, ModelError>) -> Self {
        match result {
            Ok(price) => Self::Valid(price),
            Err(error) => Self::Invalid(error),
        }
    }
}

/// Latest timestamp the model will price, relative to `now_ms`.
pub fn horizon_ms(constants: &ModelConstants, now_ms: i64) -> i64 {
    now_ms.saturating_add(i64::from(constants.max_forecast_years).saturating_mul(MS_PER_YEAR))
}

/// Days elapsed since the model origin, fractional.
pub fn days_since_start(timestamp_ms: i64, constants: &ModelConstants) -> f64 {
    (timestamp_ms - constants.start_date) as f64 / MS_PER_DAY as f64
}

/// Model price at `timestamp_ms`, validated against the genesis date and the
/// forecast horizon measured from `now_ms`.
///
/// Pure: the same inputs always give the same output.
pub fn price_at(
    timestamp_ms: i64,
    constants: &ModelConstants,
    now_ms: i64,
) -> Result<f64, ModelError> {
    if timestamp_ms < constants.start_date {
        return Err(ModelError::BeforeGenesis {
            timestamp_ms,
            start_date_ms: constants.start_date,
        });
    }

    let horizon_ms = horizon_ms(constants, now_ms);
    if timestamp_ms > horizon_ms {
        return Err(ModelError::TooFarInFuture {
            timestamp_ms,
            horizon_ms,
        });
    }

    let days = days_since_start(timestamp_ms, constants);
    if days <= 0.0 {
        return Ok(0.0);
    }

    let model_price = constants.a * days.powf(constants.b);
    if !model_price.is_finite() {
        return Err(ModelError::Overflow {
            days_since_start: days,
        });
    }

    let scaled = model_price * constants.scale;
    if !scaled.is_finite() {
        return Err(ModelError::Overflow {
            days_since_start: days,
        });
    }

    Ok(scaled)
}

/// [`price_at`] as a tagged outcome.
pub fn evaluate(timestamp_ms: i64, constants: &ModelConstants, now_ms: i64) -> ModelPrice {
    price_at(timestamp_ms, constants, now_ms).into()
}
