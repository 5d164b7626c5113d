//! Upstream candle source contract and request/error types.
//!
//! The engine only needs "a chronological sequence of (timestamp, close
//! price) records, fetched in bounded pages". [`KlineSource`] is that seam:
//! [`BinanceAdapter`](crate::adapters::BinanceAdapter) implements it over
//! HTTP, tests implement it with scripted pages.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::{Interval, Symbol};

/// Provider-side maximum number of candles per page.
pub const MAX_KLINES_PER_PAGE: usize = 1000;

/// One positional candle record as returned by the provider.
pub type RawKline = Vec<Value>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    MalformedResponse,
    Internal,
}

/// Structured upstream error; `retryable` drives the fetcher's retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    /// A body that failed to parse is treated as a transient glitch.
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// One page request: candles with open time in `[start_ms, end_ms]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlinesRequest {
    pub symbol: Symbol,
    pub interval: Interval,
    pub start_ms: i64,
    pub end_ms: i64,
    pub limit: usize,
}

impl KlinesRequest {
    pub fn new(
        symbol: Symbol,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
        limit: usize,
    ) -> Result<Self, SourceError> {
        if limit == 0 || limit > MAX_KLINES_PER_PAGE {
            return Err(SourceError::invalid_request(format!(
                "klines limit must be between 1 and {MAX_KLINES_PER_PAGE}, got {limit}"
            )));
        }
        if start_ms > end_ms {
            return Err(SourceError::invalid_request(format!(
                "klines start {start_ms} is after end {end_ms}"
            )));
        }
        Ok(Self {
            symbol,
            interval,
            start_ms,
            end_ms,
            limit,
        })
    }
}

/// Paginated candle provider.
///
/// Implementations must be `Send + Sync`; one source is shared by every
/// concurrent request.
pub trait KlineSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch one page of candles in chronological order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider is unreachable, rate limits
    /// the caller, rejects the request, or answers with an unparseable body.
    fn klines<'a>(
        &'a self,
        req: KlinesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawKline>, SourceError>> + Send + 'a>>;
}
