use thiserror::Error;

use crate::data_source::SourceError;

/// Outcome class shared by every engine error, used by transports to pick a
/// response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-correctable input; never retried.
    InvalidInput,
    /// No usable data yet; the caller may retry later.
    NotFound,
    /// Upstream provider failed after retries.
    Upstream,
    /// Unexpected computation failure.
    Internal,
}

impl ErrorClass {
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::NotFound => 404,
            Self::Upstream => 502,
            Self::Internal => 500,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Upstream => "upstream",
            Self::Internal => "internal",
        }
    }
}

/// Validation and contract errors exposed by `powerlaw-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1d, 3d, 1w")]
    InvalidInterval { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp {value} ms is outside the representable range")]
    TimestampOutOfRange { value: i64 },
    #[error("year {year} is outside the representable range")]
    YearOutOfRange { year: i32 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
    #[error("confidence level '{label}' must have a positive finite z-score")]
    InvalidZScore { label: String },
    #[error("at least one confidence level must be configured")]
    EmptyConfidenceLevels,

    #[error("smoothing window must be at least 1")]
    InvalidSmoothingWindow,
    #[error("smoothed price count {actual} does not match sample count {expected}")]
    SmoothedLengthMismatch { expected: usize, actual: usize },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must look like v<major>.<minor>.<patch>: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,

    #[error("config field '{field}' is invalid: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl ValidationError {
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::InvalidInput
    }
}

/// Reasons the power-law model declines to produce a price.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ModelError {
    #[error("timestamp {timestamp_ms} precedes the model start date {start_date_ms}")]
    BeforeGenesis { timestamp_ms: i64, start_date_ms: i64 },
    #[error("timestamp {timestamp_ms} is beyond the forecast horizon ending at {horizon_ms}")]
    TooFarInFuture { timestamp_ms: i64, horizon_ms: i64 },
    #[error("model price overflowed at {days_since_start} days since start")]
    Overflow { days_since_start: f64 },
}

impl ModelError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::BeforeGenesis { .. } | Self::TooFarInFuture { .. } => ErrorClass::InvalidInput,
            Self::Overflow { .. } => ErrorClass::Internal,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::BeforeGenesis { .. } => "model.before_genesis",
            Self::TooFarInFuture { .. } => "model.too_far_in_future",
            Self::Overflow { .. } => "model.overflow",
        }
    }
}

/// Failures of the deviation analyzer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("series contains no samples")]
    EmptySeries,
    #[error("no sample in the series has a valid model price")]
    NoValidDataPoints,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnalysisError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::EmptySeries | Self::NoValidDataPoints => ErrorClass::NotFound,
            Self::Validation(_) => ErrorClass::Internal,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptySeries => "analysis.empty_series",
            Self::NoValidDataPoints => "analysis.no_valid_data_points",
            Self::Validation(_) => "analysis.validation",
        }
    }
}

/// Failures of the forecast engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("forecast year {year} is before the current year {current_year}")]
    PastYearRequested { year: i32, current_year: i32 },
    #[error("forecast year {year} exceeds the horizon; latest allowed year is {max_year}")]
    HorizonExceeded { year: i32, max_year: i32 },
    /// `cause` is `None` when the model evaluated to zero.
    #[error("no valid model projection for {year}: {}", projection_cause(.cause))]
    InvalidProjection { year: i32, cause: Option<ModelError> },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ForecastError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::PastYearRequested { .. } | Self::HorizonExceeded { .. } => {
                ErrorClass::InvalidInput
            }
            Self::InvalidProjection {
                cause: Some(error), ..
            } => error.class(),
            Self::InvalidProjection { cause: None, .. } => ErrorClass::InvalidInput,
            Self::Analysis(error) => error.class(),
            Self::Validation(_) => ErrorClass::Internal,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::PastYearRequested { .. } => "forecast.past_year_requested",
            Self::HorizonExceeded { .. } => "forecast.horizon_exceeded",
            Self::InvalidProjection { .. } => "forecast.invalid_projection",
            Self::Analysis(error) => error.code(),
            Self::Validation(_) => "forecast.validation",
        }
    }
}

fn projection_cause(cause: &Option<ModelError>) -> String {
    match cause {
        Some(error) => error.to_string(),
        None => String::from("model price is zero"),
    }
}

/// Failures of the history fetcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("upstream unavailable after {attempts} attempt(s): {source}")]
    UpstreamUnavailable { attempts: u32, source: SourceError },
    #[error("upstream rejected the request: {0}")]
    Rejected(SourceError),
    #[error("no valid samples returned for {symbol}")]
    NoData { symbol: String },
}

impl FetchError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UpstreamUnavailable { .. } | Self::Rejected(_) => ErrorClass::Upstream,
            Self::NoData { .. } => ErrorClass::NotFound,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable { .. } => "fetch.upstream_unavailable",
            Self::Rejected(_) => "fetch.rejected",
            Self::NoData { .. } => "fetch.no_data",
        }
    }
}

/// Top-level error returned by the service facade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EngineError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Fetch(error) => error.class(),
            Self::Analysis(error) => error.class(),
            Self::Forecast(error) => error.class(),
            Self::Validation(error) => error.class(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Fetch(error) => error.code(),
            Self::Analysis(error) => error.code(),
            Self::Forecast(error) => error.code(),
            Self::Validation(_) => "engine.validation",
        }
    }

    pub const fn status_code(&self) -> u16 {
        self.class().status_code()
    }
}

/// Errors raised while loading configuration from disk or environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_class_follows_model_cause() {
        let overflow = ForecastError::InvalidProjection {
            year: 2030,
            cause: Some(ModelError::Overflow {
                days_since_start: 7000.0,
            }),
        };
        assert_eq!(overflow.class(), ErrorClass::Internal);
        assert_eq!(EngineError::from(overflow).status_code(), 500);

        let beyond = ForecastError::InvalidProjection {
            year: 2035,
            cause: Some(ModelError::TooFarInFuture {
                timestamp_ms: 2,
                horizon_ms: 1,
            }),
        };
        assert_eq!(beyond.class(), ErrorClass::InvalidInput);

        let zero = ForecastError::InvalidProjection {
            year: 2009,
            cause: None,
        };
        assert_eq!(zero.class(), ErrorClass::InvalidInput);
        assert!(zero.to_string().contains("model price is zero"));
    }

    #[test]
    fn input_errors_map_to_client_status() {
        let error = EngineError::from(ForecastError::PastYearRequested {
            year: 2020,
            current_year: 2026,
        });
        assert_eq!(error.class(), ErrorClass::InvalidInput);
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.code(), "forecast.past_year_requested");
    }

    #[test]
    fn data_quality_errors_map_to_not_found() {
        let error = EngineError::from(FetchError::NoData {
            symbol: String::from("BTCUSDT"),
        });
        assert_eq!(error.status_code(), 404);

        let error = EngineError::from(ForecastError::from(AnalysisError::EmptySeries));
        assert_eq!(error.class(), ErrorClass::NotFound);
    }

    #[test]
    fn exhausted_upstream_maps_to_gateway_status() {
        let error = EngineError::from(FetchError::UpstreamUnavailable {
            attempts: 3,
            source: SourceError::unavailable("connection reset"),
        });
        assert_eq!(error.class(), ErrorClass::Upstream);
        assert!(error.status_code() >= 500);
        assert!(error.to_string().contains("3 attempt"));
    }
}
