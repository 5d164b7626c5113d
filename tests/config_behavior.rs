//! Behavior-driven tests for configuration loading.

use std::io::Write;

use powerlaw_core::{ConfigError, EngineConfig, Interval, PowerLawService, ValidationError};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn when_no_config_is_given_system_uses_reference_defaults() {
    // Given: No file and an empty environment
    // When: Configuration is loaded
    let config = EngineConfig::load_with_env(None, no_env).expect("defaults are valid");

    // Then: The reference constants and upstream settings apply
    assert_eq!(config.constants.a, 0.0058);
    assert_eq!(config.constants.b, 1.84);
    assert_eq!(config.constants.start_date, 1_230_951_600_000);
    assert_eq!(config.constants.scale, 1.5);
    assert_eq!(config.constants.max_forecast_years, 10);
    assert_eq!(config.constants.confidence_levels["99"], 2.576);
    assert_eq!(config.upstream.symbol.as_str(), "BTCUSDT");
    assert_eq!(config.upstream.interval, Interval::OneDay);
}

#[test]
fn when_file_sets_constants_system_builds_service_with_them() {
    // Given: A config file overriding the model
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{
            "constants": {{"A": 0.01, "B": 1.9, "confidenceLevels": {{"80": 1.2816}}}},
            "upstream": {{"interval": "3d", "lookbackYears": 3}}
        }}"#
    )
    .expect("write");

    // When: It is loaded and a service is built from it
    let config = EngineConfig::load_with_env(Some(file.path()), no_env).expect("loads");
    let service = PowerLawService::from_config(&config);

    // Then: The service exposes exactly those constants
    let constants = service.get_constants();
    assert_eq!(constants.a, 0.01);
    assert_eq!(constants.b, 1.9);
    assert_eq!(constants.confidence_levels.len(), 1);
    assert_eq!(config.upstream.interval, Interval::ThreeDays);
    assert_eq!(config.upstream.lookback_years, 3);
}

#[test]
fn when_constants_are_invalid_system_refuses_to_start() {
    // Given: A non-positive exponent
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"constants": {{"B": -1.0}}}}"#).expect("write");

    // When: It is loaded
    let error = EngineConfig::load_with_env(Some(file.path()), no_env).expect_err("invalid");

    // Then: Validation names the offending field
    assert!(matches!(
        error,
        ConfigError::Validation(ValidationError::NonPositiveValue { field: "B" })
    ));
}

#[test]
fn when_env_sets_an_invalid_symbol_system_reports_the_variable() {
    // Given: A symbol with a separator
    let env = |name: &str| (name == "POWERLAW_SYMBOL").then(|| String::from("BTC-USDT"));

    // When: Configuration is loaded
    let error = EngineConfig::load_with_env(None, env).expect_err("invalid symbol");

    // Then: The variable is named in the error
    assert!(matches!(error, ConfigError::InvalidEnv { name: "POWERLAW_SYMBOL", .. }));
    assert!(error.to_string().contains("BTC-USDT"));
}

#[test]
fn when_config_has_unknown_interval_system_reports_a_parse_error() {
    // Given: An unsupported interval
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"upstream": {{"interval": "4h"}}}}"#).expect("write");

    // When: It is loaded
    let error = EngineConfig::load_with_env(Some(file.path()), no_env).expect_err("parse error");

    // Then: The file path is part of the message
    assert!(matches!(error, ConfigError::Parse { .. }));
    assert!(error.to_string().contains(&file.path().display().to_string()));
}
