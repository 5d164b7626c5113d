//! # Powerlaw Core
//!
//! Power-law valuation, deviation statistics and forecasting engine for a
//! single asset's daily price history.
//!
//! ## Overview
//!
//! - **Sample validation** of raw positional candle records
//! - **History fetcher** paging through a [`KlineSource`] with bounded retry
//!   and request pacing
//! - **Smoother**: trailing moving average over closing prices
//! - **Power-law model** `A * days^B * scale` with domain and overflow guards
//! - **Deviation analyzer**: time-decay weighted mean/std of percentage
//!   deviation from the model
//! - **Forecast engine**: base projection plus one confidence interval per
//!   configured z-score
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Binance `/klines` adapter |
//! | [`config`] | Engine configuration loading |
//! | [`data_source`] | Candle source trait and request/error types |
//! | [`deviation`] | Weighted deviation statistics |
//! | [`domain`] | Domain models (Sample, Series, ModelConstants) |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Error types and outcome classes |
//! | [`fetcher`] | Paged history download |
//! | [`forecast`] | Forecast engine |
//! | [`http_client`] | HTTP client abstraction |
//! | [`model`] | Power-law price function |
//! | [`retry`] | Retry policy |
//! | [`service`] | Service facade |
//! | [`smoothing`] | Moving average |
//! | [`throttling`] | Request pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use powerlaw_core::{EngineConfig, PowerLawService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::load(None)?;
//!     let service = PowerLawService::from_config(&config);
//!
//!     let forecast = service.get_forecast(2030).await?;
//!     println!(
//!         "2030: {:.0} ({:.0} - {:.0})",
//!         forecast.base_projection, forecast.lower_bound, forecast.upper_bound
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PowerLawService │────▶│ Forecast Engine  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       ▼
//!          │              ┌──────────────────┐
//!          │              │ Deviation / Model│
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HistoryFetcher  │────▶│ KlineSource      │
//! │ (retry, pacing) │     │ (Binance / HTTP) │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every error exposes an [`ErrorClass`] so transports can map it:
//!
//! ```rust
//! use powerlaw_core::{EngineError, ErrorClass, ForecastError};
//!
//! let error = EngineError::from(ForecastError::PastYearRequested {
//!     year: 2020,
//!     current_year: 2025,
//! });
//! assert_eq!(error.class(), ErrorClass::InvalidInput);
//! assert_eq!(error.status_code(), 400);
//! ```

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod deviation;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod http_client;
pub mod model;
pub mod retry;
pub mod service;
pub mod smoothing;
pub mod throttling;

// Adapter implementations
pub use adapters::{BinanceAdapter, BINANCE_BASE_URL};

// Configuration
pub use config::{EngineConfig, RetrySettings, UpstreamConfig};

// Data source trait and types
pub use data_source::{
    KlineSource, KlinesRequest, RawKline, SourceError, SourceErrorKind, MAX_KLINES_PER_PAGE,
};

// Statistics and forecasting
pub use deviation::{analyze, DeviationStats};
pub use forecast::{forecast, ConfidenceInterval, ForecastMetadata, ForecastResult};
pub use model::{evaluate, price_at, ModelPrice};
pub use smoothing::{moving_average, smooth, DEFAULT_SMOOTHING_WINDOW};

// Domain models
pub use domain::{
    record_open_time, validate_record, Interval, ModelConstants, Sample, Series, Symbol, UtcDateTime,
    DEFAULT_CONFIDENCE_LABEL, DEFAULT_SYMBOL, GENESIS_MS, MS_PER_DAY, MS_PER_YEAR,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};

// Error types
pub use error::{
    AnalysisError, ConfigError, EngineError, ErrorClass, FetchError, ForecastError, ModelError,
    ValidationError,
};

// Fetching
pub use fetcher::HistoryFetcher;

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Service facade
pub use service::{DeviationView, PowerLawPoint, PowerLawService, SeriesView};

// Throttling
pub use throttling::{PacingPolicy, RequestPacer};
