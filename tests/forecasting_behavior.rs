//! Behavior-driven tests for the service facade
//!
//! These tests verify the end-to-end operations a transport exposes:
//! series, deviation, forecast and constants.

use powerlaw_core::{
    price_at, AnalysisError, EngineConfig, EngineError, ErrorClass, ForecastError,
    PowerLawService, UtcDateTime, MS_PER_YEAR,
};
use powerlaw_tests::{
    daily_klines, reference_now, Arc, ModelConstants, ScriptedSource, SourceError, GENESIS_MS,
    MS_PER_DAY,
};

/// Two years of daily candles swinging up to 40% either side of the model.
fn history_around_model(now: UtcDateTime) -> Arc<ScriptedSource> {
    let constants = ModelConstants::default();
    let now_ms = now.unix_millis();
    let start = now_ms - 730 * MS_PER_DAY;
    let page = daily_klines(start, 730, |i| {
        let ts = start + i as i64 * MS_PER_DAY;
        let model = price_at(ts, &constants, now_ms).expect("in domain");
        let swing = ((i % 30) as f64 - 15.0) / 15.0;
        model * (1.0 + 0.4 * swing)
    });
    ScriptedSource::new(vec![Ok(page)])
}

fn service_over(source: Arc<ScriptedSource>) -> PowerLawService {
    PowerLawService::new(source, ModelConstants::default())
}

// =============================================================================
// Forecast
// =============================================================================

#[tokio::test]
async fn when_forecasting_a_future_year_system_returns_nested_intervals() {
    // Given: Two years of history oscillating around the model
    let now = reference_now();
    let source = history_around_model(now);
    let service = service_over(source.clone());

    // When: A forecast for 2030 is requested
    let forecast = service.get_forecast_at(2030, now).await.expect("forecast");

    // Then: Every level is present, ordered, non-negative and nested
    assert!(forecast.base_projection > 0.0);
    let levels = &forecast.confidence_intervals;
    assert_eq!(levels.len(), 3);
    for interval in levels.values() {
        assert!(interval.upper >= interval.lower);
        assert!(interval.lower >= 0.0);
    }
    assert!(levels["99"].contains(&levels["95"]));
    assert!(levels["95"].contains(&levels["90"]));

    // And: The headline bounds are the 90% interval
    assert_eq!(forecast.lower_bound, levels["90"].lower);
    assert_eq!(forecast.upper_bound, levels["90"].upper);
    assert_eq!(forecast.metadata.target_year, 2030);
    assert_eq!(forecast.metadata.sample_count, 730);
    assert_eq!(source.request_count(), 1);
}

#[tokio::test]
async fn when_forecast_is_serialized_system_uses_camel_case_fields() {
    // Given: A forecast
    let now = reference_now();
    let service = service_over(history_around_model(now));
    let forecast = service.get_forecast_at(2027, now).await.expect("forecast");

    // When: It is rendered as JSON
    let value = serde_json::to_value(&forecast).expect("serializable");

    // Then: The response shape uses camelCase keys
    assert!(value["baseProjection"].is_number());
    assert!(value["lowerBound"].is_number());
    assert!(value["upperBound"].is_number());
    assert!(value["confidenceIntervals"]["95"]["lower"].is_number());
    assert!(value["historicalDeviation"]["weightedMeanPct"].is_number());
    assert!(value["historicalDeviation"]["effectiveSampleSize"].is_number());
    assert_eq!(value["metadata"]["targetYear"], 2027);
    assert_eq!(value["metadata"]["defaultConfidence"], "90");
    assert_eq!(value["metadata"]["generatedAt"], "2025-06-15T00:00:00Z");
}

#[tokio::test]
async fn when_past_year_is_requested_system_fails_without_fetching() {
    // Given: A service whose source would succeed
    let now = reference_now();
    let source = history_around_model(now);
    let service = service_over(source.clone());

    // When: The previous year is requested
    let error = service
        .get_forecast_at(now.year() - 1, now)
        .await
        .expect_err("past year must fail");

    // Then: An input error is returned and the source was never called
    assert!(matches!(
        error,
        EngineError::Forecast(ForecastError::PastYearRequested { year: 2024, current_year: 2025 })
    ));
    assert_eq!(error.class(), ErrorClass::InvalidInput);
    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn when_year_is_beyond_horizon_system_fails_without_fetching() {
    // Given: The default ten-year horizon
    let now = reference_now();
    let source = history_around_model(now);
    let service = service_over(source.clone());

    // When: Eleven years out is requested
    let error = service
        .get_forecast_at(2036, now)
        .await
        .expect_err("beyond horizon must fail");

    // Then: The horizon is reported and nothing was fetched
    assert!(matches!(
        error,
        EngineError::Forecast(ForecastError::HorizonExceeded { max_year: 2035, .. })
    ));
    assert_eq!(error.status_code(), 400);
    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn when_the_current_year_is_requested_system_forecasts_it() {
    // Given: Any history
    let now = reference_now();
    let service = service_over(history_around_model(now));

    // When: The current year is requested
    let forecast = service.get_forecast_at(2025, now).await.expect("current year is allowed");

    // Then: The projection targets January 1st of this year
    assert_eq!(
        forecast.metadata.target_timestamp,
        UtcDateTime::start_of_year(2025).expect("valid").unix_millis()
    );
}

#[tokio::test]
async fn when_history_predates_genesis_system_has_no_valid_points() {
    // Given: A history entirely before the model start date
    let now = UtcDateTime::from_unix_millis(GENESIS_MS + 10 * MS_PER_DAY).expect("valid");
    let source = ScriptedSource::new(vec![Ok(daily_klines(
        GENESIS_MS - 20 * MS_PER_DAY,
        10,
        |_| 0.01,
    ))]);
    let service = service_over(source);

    // When: The deviation is requested
    let error = service.get_deviation_at(now).await.expect_err("no valid points");

    // Then: A not-found class error is returned
    assert!(matches!(
        error,
        EngineError::Analysis(AnalysisError::NoValidDataPoints)
    ));
    assert_eq!(error.class(), ErrorClass::NotFound);
}

// =============================================================================
// Series and deviation
// =============================================================================

#[tokio::test]
async fn when_series_is_requested_system_returns_cent_rounded_points() {
    // Given: A week of prices with sub-cent precision
    let now = reference_now();
    let source = ScriptedSource::new(vec![Ok(daily_klines(
        now.unix_millis() - 7 * MS_PER_DAY,
        7,
        |i| 100_000.123_456 + i as f64,
    ))]);
    let service = service_over(source);

    // When: The series is requested
    let view = service.get_series_at(now).await.expect("series");

    // Then: Prices carry at most two decimals and pairs mirror the points
    assert_eq!(view.points.len(), 7);
    for point in &view.points {
        assert!(((point.actual_price * 100.0).round() - point.actual_price * 100.0).abs() < 1e-6);
        assert!(point.model_price > 0.0);
    }
    // First six positions are back-filled with the first close.
    assert_eq!(view.points[0].actual_price, view.points[5].actual_price);
    assert_eq!(view.series[6], (view.points[6].timestamp, view.points[6].actual_price));
}

#[tokio::test]
async fn when_price_matches_model_system_reports_zero_deviation() {
    // Given: A single candle priced exactly at the model
    let now = reference_now();
    let now_ms = now.unix_millis();
    let ts = now_ms - MS_PER_DAY;
    let model = price_at(ts, &ModelConstants::default(), now_ms).expect("in domain");
    let source = ScriptedSource::new(vec![Ok(daily_klines(ts, 1, |_| model))]);
    let service = service_over(source);

    // When: The deviation is requested
    let view = service.get_deviation_at(now).await.expect("deviation");

    // Then: Deviation is zero and prices are reported in cents
    assert!(view.deviation_pct.abs() < 1e-9);
    assert_eq!(view.current_price, (model * 100.0).round() / 100.0);
}

#[tokio::test(start_paused = true)]
async fn when_upstream_is_down_system_surfaces_upstream_class() {
    // Given: A provider that never answers
    let source = ScriptedSource::new(vec![
        Err(SourceError::unavailable("down")),
        Err(SourceError::unavailable("down")),
        Err(SourceError::unavailable("down")),
    ]);
    let service = service_over(source.clone());

    // When: The series is requested
    let error = service
        .get_series_at(reference_now())
        .await
        .expect_err("upstream down");

    // Then: The error maps to a 5xx-class upstream failure
    assert_eq!(error.class(), ErrorClass::Upstream);
    assert!(error.status_code() >= 500);
    assert_eq!(source.request_count(), 3);
}

// =============================================================================
// Constants
// =============================================================================

#[test]
fn when_constants_are_requested_system_returns_configured_values() {
    // Given: A configuration with a custom scale and horizon
    let mut config = EngineConfig::default();
    config.constants.scale = 2.0;
    config.constants.max_forecast_years = 20;
    let service = PowerLawService::with_source(ScriptedSource::new(Vec::new()), &config);

    // When: Constants are requested
    let constants = service.get_constants();

    // Then: They reflect the configuration, and serialize with legacy keys
    assert_eq!(constants.scale, 2.0);
    assert_eq!(constants.max_forecast_years, 20);
    let value = serde_json::to_value(&constants).expect("serializable");
    assert_eq!(value["B"], 1.84);
    assert_eq!(value["startDate"], GENESIS_MS);
}

#[test]
fn model_horizon_is_measured_in_julian_years() {
    let constants = ModelConstants::default();
    let now_ms = reference_now().unix_millis();
    assert!(price_at(now_ms + 10 * MS_PER_YEAR, &constants, now_ms).is_ok());
    assert!(price_at(now_ms + 10 * MS_PER_YEAR + 1, &constants, now_ms).is_err());
}
