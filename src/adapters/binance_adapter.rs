//! Binance klines data adapter.
//!
//! Fetches hourly/4h/daily candles from the public klines endpoint, paging
//! through 1000-row batches, then deduplicates, sorts and writes through to
//! the CSV cache. Cached assets are served without touching the network.
//! Transient failures (connect errors, timeouts, 429/5xx) retry with
//! exponential backoff.

use chrono::{DateTime, NaiveDateTime};
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::csv_cache_adapter::CsvCacheAdapter;
use crate::domain::candle::{AssetSpec, Candle};
use crate::domain::error::SignalbenchError;
use crate::ports::data_port::CandleSource;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const PAGE_LIMIT: usize = 1000;

/// One row of the klines response: open time (ms), then OHLCV as strings,
/// close time, quote volume, trade count, taker volumes and an ignored
/// field.
type KlineRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    cache: CsvCacheAdapter,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceAdapter {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self::with_base_url(cache_dir, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(cache_dir: PathBuf, base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: CsvCacheAdapter::new(cache_dir),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn cache(&self) -> &CsvCacheAdapter {
        &self.cache
    }

    /// Fetch the full window from the API and write it through to the
    /// cache, bypassing any existing cached file.
    pub fn refresh(
        &self,
        spec: &AssetSpec,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SignalbenchError> {
        let mut candles = self.fetch_paginated(spec, start, end)?;

        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);

        if candles.is_empty() {
            return Err(SignalbenchError::NoData {
                symbol: spec.symbol.clone(),
                timeframe: spec.timeframe.to_string(),
            });
        }

        self.cache.store(spec, &candles)?;
        Ok(candles)
    }

    fn fetch_paginated(
        &self,
        spec: &AssetSpec,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SignalbenchError> {
        let step_ms = spec.timeframe.duration().num_milliseconds();
        let end_ms = end.and_utc().timestamp_millis();
        let mut current_ms = start.and_utc().timestamp_millis();
        let mut candles = Vec::new();

        while current_ms <= end_ms {
            let url = format!(
                "{}/api/v3/klines?symbol={}USDT&interval={}&startTime={}&endTime={}&limit={}",
                self.base_url, spec.symbol, spec.timeframe, current_ms, end_ms, PAGE_LIMIT
            );

            let rows = self.request_page(&spec.symbol, &url)?;
            if rows.is_empty() {
                break;
            }

            let batch_len = rows.len();
            let last_open_ms = rows.last().map(|r| r.0).unwrap_or(current_ms);
            for row in rows {
                candles.push(kline_to_candle(&spec.symbol, row)?);
            }

            // Resume from the slot after the last row the API returned.
            current_ms = last_open_ms + step_ms;

            if batch_len < PAGE_LIMIT {
                break;
            }
        }

        Ok(candles)
    }

    fn request_page(
        &self,
        symbol: &str,
        url: &str,
    ) -> Result<Vec<KlineRow>, SignalbenchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error()
                    {
                        last_error = Some(SignalbenchError::Http {
                            symbol: symbol.to_string(),
                            reason: format!("HTTP {status}"),
                        });
                        continue;
                    }
                    if !status.is_success() {
                        return Err(SignalbenchError::Http {
                            symbol: symbol.to_string(),
                            reason: format!("HTTP {status}"),
                        });
                    }
                    return resp.json::<Vec<KlineRow>>().map_err(|e| {
                        SignalbenchError::Http {
                            symbol: symbol.to_string(),
                            reason: format!("malformed klines response: {e}"),
                        }
                    });
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(SignalbenchError::Http {
                        symbol: symbol.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    return Err(SignalbenchError::Http {
                        symbol: symbol.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SignalbenchError::Http {
            symbol: symbol.to_string(),
            reason: "max retries exceeded".to_string(),
        }))
    }
}

impl CandleSource for BinanceAdapter {
    fn fetch_candles(
        &self,
        spec: &AssetSpec,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SignalbenchError> {
        if self.cache.contains(spec) {
            return self.cache.fetch_candles(spec, start, end);
        }
        let mut candles = self.refresh(spec, start, end)?;
        candles.retain(|c| c.timestamp >= start && c.timestamp <= end);
        Ok(candles)
    }
}

fn kline_to_candle(symbol: &str, row: KlineRow) -> Result<Candle, SignalbenchError> {
    let timestamp = DateTime::from_timestamp_millis(row.0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| SignalbenchError::Http {
            symbol: symbol.to_string(),
            reason: format!("invalid kline timestamp: {}", row.0),
        })?;

    let parse = |raw: &str, field: &str| -> Result<Option<f64>, SignalbenchError> {
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| SignalbenchError::Http {
                symbol: symbol.to_string(),
                reason: format!("invalid kline {field}: {raw:?}"),
            })
    };

    Ok(Candle {
        timestamp,
        open: parse(&row.1, "open")?,
        high: parse(&row.2, "high")?,
        low: parse(&row.3, "low")?,
        close: parse(&row.4, "close")?,
        volume: parse(&row.5, "volume")?,
    })
}
