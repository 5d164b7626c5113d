use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::data_source::{KlineSource, KlinesRequest, RawKline, SourceError};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};

pub const BINANCE_BASE_URL: &str = "https://api.binance.com/api/v3";

/// Binance public market-data adapter for `/klines`.
#[derive(Clone)]
pub struct BinanceAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(ReqwestHttpClient::default()),
            base_url: String::from(BINANCE_BASE_URL),
            timeout_ms: 10_000,
        }
    }
}

impl BinanceAdapter {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout_ms,
            ..Self::default()
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, req: &KlinesRequest) -> HttpRequest {
        HttpRequest::get(format!("{}/klines", self.base_url))
            .with_query("symbol", req.symbol.as_str())
            .with_query("interval", req.interval.as_str())
            .with_query("startTime", req.start_ms)
            .with_query("endTime", req.end_ms)
            .with_query("limit", req.limit)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms)
    }
}

impl KlineSource for BinanceAdapter {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn klines<'a>(
        &'a self,
        req: KlinesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawKline>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.build_request(&req);
            debug!(url = %request.full_url(), "requesting klines page");

            let response = self.http_client.execute(request).await.map_err(|error| {
                if error.retryable() {
                    SourceError::unavailable(format!("binance transport error: {}", error.message()))
                } else {
                    SourceError::internal(format!("binance transport error: {}", error.message()))
                }
            })?;

            check_status(&response)?;
            parse_klines(&response.body)
        })
    }
}

fn check_status(response: &HttpResponse) -> Result<(), SourceError> {
    if response.is_success() {
        return Ok(());
    }

    let detail = error_detail(&response.body);
    let message = format!("binance returned status {}{detail}", response.status);
    Err(match response.status {
        // 418 is Binance's IP ban after ignoring 429s.
        429 | 418 => SourceError::rate_limited(message),
        408 | 500..=599 => SourceError::unavailable(message),
        _ => SourceError::invalid_request(message),
    })
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("msg").and_then(Value::as_str).map(str::to_owned))
        .map(|msg| format!(": {msg}"))
        .unwrap_or_default()
}

fn parse_klines(body: &str) -> Result<Vec<RawKline>, SourceError> {
    let rows: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed_response(format!("failed to parse binance klines: {e}")))?;

    // Non-array rows become empty records so the sample validator drops them.
    Ok(rows
        .into_iter()
        .map(|row| match row {
            Value::Array(fields) => fields,
            _ => Vec::new(),
        })
        .collect())
}
