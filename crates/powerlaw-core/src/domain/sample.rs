use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

const OPEN_TIME_FIELD: usize = 0;
const CLOSE_PRICE_FIELD: usize = 4;
const MIN_RECORD_FIELDS: usize = 5;

/// One validated (open time, close price) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    timestamp: i64,
    close_price: f64,
}

impl Sample {
    pub fn new(timestamp: i64, close_price: f64) -> Result<Self, ValidationError> {
        if timestamp <= 0 {
            return Err(ValidationError::NonPositiveValue { field: "timestamp" });
        }
        if !close_price.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "close_price",
            });
        }
        if close_price <= 0.0 {
            return Err(ValidationError::NonPositiveValue {
                field: "close_price",
            });
        }

        Ok(Self {
            timestamp,
            close_price,
        })
    }

    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub const fn close_price(&self) -> f64 {
        self.close_price
    }
}

/// Validate a positional candle record from the upstream provider.
///
/// Returns `None` for anything malformed; a bad record is dropped rather than
/// failing the run.
pub fn validate_record(record: &[Value]) -> Option<Sample> {
    if record.len() < MIN_RECORD_FIELDS {
        return None;
    }

    let timestamp = record_open_time(record)?;
    let close_price = parse_price(&record[CLOSE_PRICE_FIELD])?;
    Sample::new(timestamp, close_price).ok()
}

/// Open time of a raw record, regardless of whether its price is usable.
pub fn record_open_time(record: &[Value]) -> Option<i64> {
    record.get(OPEN_TIME_FIELD).and_then(parse_timestamp)
}

fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|raw| raw.is_finite() && raw.fract() == 0.0 && raw.abs() < i64::MAX as f64)
                .map(|raw| raw as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Chronological, timestamp-unique sequence of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Sort ascending by timestamp and collapse duplicates, keeping the sample
    /// that arrived last.
    pub fn from_samples(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(Sample::timestamp);

        let mut deduped: Vec<Sample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match deduped.last_mut() {
                Some(last) if last.timestamp == sample.timestamp => *last = sample,
                _ => deduped.push(sample),
            }
        }

        Self { samples: deduped }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(Sample::close_price)
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
