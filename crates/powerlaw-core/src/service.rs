//! Service facade binding fetch, smoothing, model and statistics into the
//! four operations a transport exposes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::BinanceAdapter;
use crate::config::EngineConfig;
use crate::data_source::KlineSource;
use crate::deviation::deviation_pct;
use crate::error::{AnalysisError, EngineError};
use crate::fetcher::HistoryFetcher;
use crate::forecast::{self, ForecastResult};
use crate::model::{self, ModelPrice};
use crate::smoothing;
use crate::throttling::RequestPacer;
use crate::{Interval, ModelConstants, Series, Symbol, UtcDateTime};

/// Smoothed price paired with the model price at the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerLawPoint {
    pub timestamp: i64,
    pub actual_price: f64,
    /// 0 where the model is undefined.
    pub model_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesView {
    /// `[timestamp, smoothedPrice]` pairs.
    pub series: Vec<(i64, f64)>,
    pub points: Vec<PowerLawPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationView {
    pub deviation_pct: f64,
    pub current_price: f64,
    pub model_price: f64,
}

/// Round to whole cents for presentation.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Entry point for every engine operation.
///
/// Cheap to clone; clones share the upstream source, pacer budget and
/// constants.
#[derive(Clone)]
pub struct PowerLawService {
    fetcher: HistoryFetcher,
    constants: Arc<ModelConstants>,
    symbol: Symbol,
    interval: Interval,
    lookback_years: u32,
    smoothing_window: usize,
}

impl PowerLawService {
    /// Service over `source` with default upstream, retry and smoothing
    /// settings.
    pub fn new(source: Arc<dyn KlineSource>, constants: ModelConstants) -> Self {
        let config = EngineConfig {
            constants,
            ..EngineConfig::default()
        };
        Self::with_source(source, &config)
    }

    /// Service over the Binance adapter described by `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let adapter = BinanceAdapter::new(config.upstream.base_url.clone(), config.upstream.timeout_ms);
        Self::with_source(Arc::new(adapter), config)
    }

    pub fn with_source(source: Arc<dyn KlineSource>, config: &EngineConfig) -> Self {
        let fetcher = HistoryFetcher::new(source)
            .with_retry(config.retry.to_retry_config())
            .with_pacer(RequestPacer::new(config.pacing))
            .with_page_limit(config.upstream.page_limit);

        Self {
            fetcher,
            constants: Arc::new(config.constants.clone()),
            symbol: config.upstream.symbol.clone(),
            interval: config.upstream.interval,
            lookback_years: config.upstream.lookback_years,
            smoothing_window: config.smoothing_window.max(1),
        }
    }

    pub fn constants(&self) -> &ModelConstants {
        &self.constants
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    pub fn get_constants(&self) -> ModelConstants {
        self.constants.as_ref().clone()
    }

    pub async fn get_series(&self) -> Result<SeriesView, EngineError> {
        self.get_series_at(UtcDateTime::now()).await
    }

    pub async fn get_series_at(&self, now: UtcDateTime) -> Result<SeriesView, EngineError> {
        let (series, smoothed) = self.load_history(now).await?;
        let now_ms = now.unix_millis();

        let mut invalid = 0_usize;
        let points: Vec<PowerLawPoint> = series
            .iter()
            .zip(&smoothed)
            .map(|(sample, actual)| {
                let model_price = model::evaluate(sample.timestamp(), &self.constants, now_ms);
                if let ModelPrice::Invalid(reason) = model_price {
                    invalid += 1;
                    debug!(timestamp = sample.timestamp(), code = reason.code(), "model price undefined");
                }
                PowerLawPoint {
                    timestamp: sample.timestamp(),
                    actual_price: round_cents(*actual),
                    model_price: round_cents(model_price.or_zero()),
                }
            })
            .collect();
        if invalid > 0 {
            debug!(invalid, "points reported with zero model price");
        }

        Ok(SeriesView {
            series: points
                .iter()
                .map(|point| (point.timestamp, point.actual_price))
                .collect(),
            points,
        })
    }

    pub async fn get_deviation(&self) -> Result<DeviationView, EngineError> {
        self.get_deviation_at(UtcDateTime::now()).await
    }

    /// Deviation of the latest smoothed price from its model price.
    pub async fn get_deviation_at(&self, now: UtcDateTime) -> Result<DeviationView, EngineError> {
        let (series, smoothed) = self.load_history(now).await?;
        let (Some(latest), Some(current_price)) = (series.latest(), smoothed.last().copied()) else {
            return Err(AnalysisError::EmptySeries.into());
        };

        let model_price = model::evaluate(latest.timestamp(), &self.constants, now.unix_millis())
            .usable()
            .ok_or(AnalysisError::NoValidDataPoints)?;

        Ok(DeviationView {
            deviation_pct: deviation_pct(current_price, model_price),
            current_price: round_cents(current_price),
            model_price: round_cents(model_price),
        })
    }

    pub async fn get_forecast(&self, year: i32) -> Result<ForecastResult, EngineError> {
        self.get_forecast_at(year, UtcDateTime::now()).await
    }

    /// Year bounds are checked before any upstream request is made.
    pub async fn get_forecast_at(
        &self,
        year: i32,
        now: UtcDateTime,
    ) -> Result<ForecastResult, EngineError> {
        forecast::validate_year(year, &self.constants, now)?;

        let (series, smoothed) = self.load_history(now).await?;
        let result = forecast::forecast(
            year,
            &series,
            &smoothed,
            self.smoothing_window,
            &self.constants,
            now,
        )?;
        Ok(result)
    }

    async fn load_history(&self, now: UtcDateTime) -> Result<(Series, Vec<f64>), EngineError> {
        let series = self
            .fetcher
            .fetch_until(&self.symbol, self.interval, self.lookback_years, now.unix_millis())
            .await?;
        let smoothed = smoothing::smooth(&series, self.smoothing_window)?;
        Ok((series, smoothed))
    }
}

impl std::fmt::Debug for PowerLawService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerLawService")
            .field("symbol", &self.symbol)
            .field("interval", &self.interval)
            .field("lookback_years", &self.lookback_years)
            .field("smoothing_window", &self.smoothing_window)
            .finish_non_exhaustive()
    }
}

impl Default for PowerLawService {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
