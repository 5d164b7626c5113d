//! Paged history download with bounded retry.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::data_source::{KlineSource, KlinesRequest, RawKline, MAX_KLINES_PER_PAGE};
use crate::domain::{
    record_open_time, validate_record, Interval, Sample, Series, Symbol, UtcDateTime, MS_PER_DAY,
};
use crate::error::FetchError;
use crate::retry::RetryConfig;
use crate::throttling::RequestPacer;

/// Downloads a complete daily history from a [`KlineSource`].
///
/// Every page goes through the pacer and gets `retry.max_attempts` tries.
/// One exhausted page aborts the whole download; partial histories are never
/// returned.
#[derive(Clone)]
pub struct HistoryFetcher {
    source: Arc<dyn KlineSource>,
    retry: RetryConfig,
    pacer: RequestPacer,
    page_limit: usize,
}

impl HistoryFetcher {
    pub fn new(source: Arc<dyn KlineSource>) -> Self {
        Self {
            source,
            retry: RetryConfig::default(),
            pacer: RequestPacer::default(),
            page_limit: MAX_KLINES_PER_PAGE,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Page size, clamped to `1..=MAX_KLINES_PER_PAGE`.
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.clamp(1, MAX_KLINES_PER_PAGE);
        self
    }

    /// Fetch `lookback_years` of history ending now.
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        interval: Interval,
        lookback_years: u32,
    ) -> Result<Series, FetchError> {
        let end_ms = UtcDateTime::now().unix_millis();
        self.fetch_until(symbol, interval, lookback_years, end_ms).await
    }

    /// Fetch `lookback_years` (of 365 days) of history ending at `end_ms`.
    pub async fn fetch_until(
        &self,
        symbol: &Symbol,
        interval: Interval,
        lookback_years: u32,
        end_ms: i64,
    ) -> Result<Series, FetchError> {
        let start_ms = end_ms - i64::from(lookback_years) * 365 * MS_PER_DAY;
        let records = self.collect_pages(symbol, interval, start_ms, end_ms).await?;

        let raw_count = records.len();
        let samples: Vec<Sample> = records
            .iter()
            .filter_map(|record| validate_record(record))
            .collect();
        let rejected = raw_count - samples.len();
        if rejected > 0 {
            debug!(rejected, raw_count, "dropped malformed candle records");
        }

        let series = Series::from_samples(samples);
        if series.is_empty() {
            return Err(FetchError::NoData {
                symbol: symbol.to_string(),
            });
        }

        info!(
            source = self.source.name(),
            %symbol,
            samples = series.len(),
            "history fetched"
        );
        Ok(series)
    }

    async fn collect_pages(
        &self,
        symbol: &Symbol,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<RawKline>, FetchError> {
        let mut records = Vec::new();
        let mut current_start = start_ms;

        while current_start < end_ms {
            let request = KlinesRequest::new(
                symbol.clone(),
                interval,
                current_start,
                end_ms,
                self.page_limit,
            )
            .map_err(FetchError::Rejected)?;

            let page = self.fetch_page(request).await?;
            let page_len = page.len();
            debug!(current_start, page_len, "klines page received");

            // Paging follows raw open times; prices are validated later.
            let last_open = page.iter().filter_map(|record| record_open_time(record)).max();
            records.extend(page);

            // A short page means the provider has nothing further.
            if page_len < self.page_limit {
                break;
            }
            let Some(last_open) = last_open else {
                break;
            };
            let next_start = last_open + interval.millis();
            if next_start <= current_start {
                break;
            }
            current_start = next_start;
        }

        Ok(records)
    }

    async fn fetch_page(&self, request: KlinesRequest) -> Result<Vec<RawKline>, FetchError> {
        let mut attempt = 0_u32;

        loop {
            self.pacer.acquire().await;

            let error = match self.source.klines(request.clone()).await {
                Ok(page) => return Ok(page),
                Err(error) if !error.retryable() => return Err(FetchError::Rejected(error)),
                Err(error) => error,
            };

            let Some(delay) = self.retry.delay_after(attempt) else {
                return Err(FetchError::UpstreamUnavailable {
                    attempts: attempt + 1,
                    source: error,
                });
            };

            warn!(
                attempt = attempt + 1,
                max_attempts = self.retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "klines page failed; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceError;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Replays scripted page outcomes and records every request.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<RawKline>, SourceError>>>,
        requests: Mutex<Vec<KlinesRequest>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<RawKline>, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<KlinesRequest> {
            self.requests.lock().expect("not poisoned").clone()
        }
    }

    impl KlineSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn klines<'a>(
            &'a self,
            req: KlinesRequest,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<RawKline>, SourceError>> + Send + 'a>> {
            self.requests.lock().expect("not poisoned").push(req);
            let next = self
                .script
                .lock()
                .expect("not poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { next })
        }
    }

    fn kline(open_ms: i64, close: &str) -> RawKline {
        match json!([open_ms, "1", "1", "1", close, "0"]) {
            Value::Array(fields) => fields,
            _ => unreachable!(),
        }
    }

    fn days(start_ms: i64, count: usize) -> Vec<RawKline> {
        (0..count)
            .map(|i| kline(start_ms + i as i64 * MS_PER_DAY, "100.0"))
            .collect()
    }

    fn btc() -> Symbol {
        Symbol::parse("BTCUSDT").expect("valid")
    }

    const END_MS: i64 = 1_700_000_000_000;

    #[tokio::test]
    async fn advances_pages_until_short_page() {
        let first_open = END_MS - 10 * MS_PER_DAY;
        let source = ScriptedSource::new(vec![
            Ok(days(first_open, 3)),
            Ok(days(first_open + 3 * MS_PER_DAY, 2)),
        ]);
        let fetcher = HistoryFetcher::new(source.clone()).with_page_limit(3);

        let series = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect("fetch succeeds");

        assert_eq!(series.len(), 5);
        let requests = source.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].start_ms, END_MS - 365 * MS_PER_DAY);
        assert_eq!(requests[1].start_ms, first_open + 3 * MS_PER_DAY);
        assert!(requests.iter().all(|r| r.end_ms == END_MS && r.limit == 3));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_with_backoff() {
        let source = ScriptedSource::new(vec![
            Err(SourceError::unavailable("reset")),
            Err(SourceError::rate_limited("slow down")),
            Ok(days(END_MS - 2 * MS_PER_DAY, 2)),
        ]);
        let fetcher = HistoryFetcher::new(source.clone());

        let started = tokio::time::Instant::now();
        let series = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect("third attempt succeeds");

        assert_eq!(series.len(), 2);
        assert_eq!(source.requests().len(), 3);
        // 1s after the first failure, 2s after the second.
        let waited = started.elapsed();
        assert!(waited >= std::time::Duration::from_secs(3), "waited {waited:?}");
        assert!(waited < std::time::Duration::from_secs(4), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_abort_with_upstream_unavailable() {
        let source = ScriptedSource::new(vec![
            Ok(days(END_MS - 300 * MS_PER_DAY, 2)),
            Err(SourceError::unavailable("down")),
            Err(SourceError::unavailable("down")),
            Err(SourceError::unavailable("down")),
        ]);
        let fetcher = HistoryFetcher::new(source.clone()).with_page_limit(2);

        let error = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect_err("partial data must not be returned");

        assert!(matches!(error, FetchError::UpstreamUnavailable { attempts: 3, .. }));
        assert_eq!(source.requests().len(), 4);
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_immediately() {
        let source = ScriptedSource::new(vec![Err(SourceError::invalid_request("bad symbol"))]);
        let fetcher = HistoryFetcher::new(source.clone());

        let error = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect_err("must fail");

        assert!(matches!(error, FetchError::Rejected(_)));
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn all_invalid_records_yield_no_data() {
        let source = ScriptedSource::new(vec![Ok(vec![
            kline(END_MS - MS_PER_DAY, "0"),
            kline(END_MS - 2 * MS_PER_DAY, "not-a-price"),
            vec![json!(END_MS)],
        ])]);
        let fetcher = HistoryFetcher::new(source);

        let error = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect_err("must fail");

        assert!(matches!(error, FetchError::NoData { .. }));
    }

    #[tokio::test]
    async fn full_page_of_rejected_records_still_advances() {
        let first_open = END_MS - 10 * MS_PER_DAY;
        let source = ScriptedSource::new(vec![
            Ok((0..3)
                .map(|i| kline(first_open + i * MS_PER_DAY, "0"))
                .collect()),
            Ok(days(first_open + 3 * MS_PER_DAY, 2)),
        ]);
        let fetcher = HistoryFetcher::new(source.clone()).with_page_limit(3);

        let series = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect("later page has data");

        assert_eq!(series.len(), 2);
        let requests = source.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].start_ms, first_open + 3 * MS_PER_DAY);
    }

    #[tokio::test]
    async fn overlapping_pages_are_deduplicated_last_write_wins() {
        let open = END_MS - 5 * MS_PER_DAY;
        let source = ScriptedSource::new(vec![
            Ok(vec![kline(open, "10"), kline(open + MS_PER_DAY, "11")]),
            Ok(vec![kline(open + MS_PER_DAY, "12")]),
        ]);
        let fetcher = HistoryFetcher::new(source).with_page_limit(2);

        let series = fetcher
            .fetch_until(&btc(), Interval::OneDay, 1, END_MS)
            .await
            .expect("fetch succeeds");

        let closes: Vec<f64> = series.closes().collect();
        assert_eq!(closes, vec![10.0, 12.0]);
    }
}
