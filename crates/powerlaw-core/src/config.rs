//! Engine configuration: JSON file, then `POWERLAW_*` environment overrides,
//! then validation.
//!
//! | Env Var | Config Field |
//! |---------|--------------|
//! | `POWERLAW_BASE_URL` | `upstream.baseUrl` |
//! | `POWERLAW_SYMBOL` | `upstream.symbol` |
//! | `POWERLAW_INTERVAL` | `upstream.interval` |
//! | `POWERLAW_LOOKBACK_YEARS` | `upstream.lookbackYears` |
//! | `POWERLAW_PAGE_LIMIT` | `upstream.pageLimit` |
//! | `POWERLAW_TIMEOUT_MS` | `upstream.timeoutMs` |
//! | `POWERLAW_MAX_ATTEMPTS` | `retry.maxAttempts` |
//! | `POWERLAW_SMOOTHING_WINDOW` | `smoothingWindow` |
//! | `POWERLAW_MAX_FORECAST_YEARS` | `constants.maxForecastYears` |

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::BINANCE_BASE_URL;
use crate::data_source::MAX_KLINES_PER_PAGE;
use crate::error::ConfigError;
use crate::retry::{Backoff, RetryConfig};
use crate::smoothing::DEFAULT_SMOOTHING_WINDOW;
use crate::throttling::PacingPolicy;
use crate::{Interval, ModelConstants, Symbol, ValidationError};

pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Upstream candle provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamConfig {
    pub base_url: String,
    pub symbol: Symbol,
    pub interval: Interval,
    pub lookback_years: u32,
    pub page_limit: usize,
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_BASE_URL.to_owned(),
            symbol: Symbol::default(),
            interval: Interval::default(),
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            page_limit: MAX_KLINES_PER_PAGE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Serializable form of [`RetryConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter: false,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(self) -> RetryConfig {
        if self.max_attempts <= 1 {
            return RetryConfig::no_retry();
        }
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            backoff: Backoff::Exponential {
                base: Duration::from_millis(self.base_delay_ms),
                factor: 2.0,
                max: Duration::from_millis(self.max_delay_ms),
                jitter: self.jitter,
            },
        }
    }
}

/// Everything the service needs at startup. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub constants: ModelConstants,
    pub upstream: UpstreamConfig,
    pub retry: RetrySettings,
    pub pacing: PacingPolicy,
    pub smoothing_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            constants: ModelConstants::default(),
            upstream: UpstreamConfig::default(),
            retry: RetrySettings::default(),
            pacing: PacingPolicy::default(),
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl EngineConfig {
    /// Load from `path` (defaults when `None`), apply process environment
    /// overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// [`EngineConfig::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Only non-empty variables take effect; unparseable values are errors.
    pub fn apply_env_overrides<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &'static str| {
            env(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(|value| (name, value))
        };

        if let Some((name, value)) = lookup("POWERLAW_BASE_URL") {
            info!(name, "env override");
            self.upstream.base_url = value;
        }
        if let Some((name, value)) = lookup("POWERLAW_SYMBOL") {
            info!(name, value = %value, "env override");
            self.upstream.symbol =
                Symbol::parse(&value).map_err(|_| ConfigError::InvalidEnv { name, value })?;
        }
        if let Some((name, value)) = lookup("POWERLAW_INTERVAL") {
            self.upstream.interval = parse_env(name, value)?;
        }
        if let Some((name, value)) = lookup("POWERLAW_LOOKBACK_YEARS") {
            self.upstream.lookback_years = parse_env(name, value)?;
        }
        if let Some((name, value)) = lookup("POWERLAW_PAGE_LIMIT") {
            self.upstream.page_limit = parse_env(name, value)?;
        }
        if let Some((name, value)) = lookup("POWERLAW_TIMEOUT_MS") {
            self.upstream.timeout_ms = parse_env(name, value)?;
        }
        if let Some((name, value)) = lookup("POWERLAW_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_env(name, value)?;
        }
        if let Some((name, value)) = lookup("POWERLAW_SMOOTHING_WINDOW") {
            self.smoothing_window = parse_env(name, value)?;
        }
        if let Some((name, value)) = lookup("POWERLAW_MAX_FORECAST_YEARS") {
            self.constants.max_forecast_years = parse_env(name, value)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.constants.validate()?;

        let base_url = self.upstream.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(invalid("upstream.baseUrl", "must be an http(s) URL"));
        }
        if self.upstream.lookback_years == 0 {
            return Err(invalid("upstream.lookbackYears", "must be at least 1"));
        }
        if self.upstream.page_limit == 0 || self.upstream.page_limit > MAX_KLINES_PER_PAGE {
            return Err(invalid(
                "upstream.pageLimit",
                format!("must be between 1 and {MAX_KLINES_PER_PAGE}"),
            ));
        }
        if self.upstream.timeout_ms == 0 {
            return Err(invalid("upstream.timeoutMs", "must be greater than zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.maxAttempts", "must be at least 1"));
        }
        if self.pacing.limit == 0 || self.pacing.window_ms == 0 {
            return Err(invalid("pacing", "limit and windowMs must be greater than zero"));
        }
        if self.smoothing_window == 0 {
            return Err(ValidationError::InvalidSmoothingWindow);
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    match value.parse::<T>() {
        Ok(parsed) => {
            info!(name, value = %value, "env override");
            Ok(parsed)
        }
        Err(_) => Err(ConfigError::InvalidEnv { name, value }),
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
