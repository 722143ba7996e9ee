#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbench::domain::candle::{AssetSpec, Candle};
use signalbench::domain::error::SignalbenchError;
use signalbench::domain::signal::SignalPoint;
use signalbench::ports::data_port::CandleSource;
use std::collections::HashMap;

pub struct MockCandleSource {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl CandleSource for MockCandleSource {
    fn fetch_candles(
        &self,
        spec: &AssetSpec,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SignalbenchError> {
        if let Some(reason) = self.errors.get(&spec.symbol) {
            return Err(SignalbenchError::Cache {
                reason: reason.clone(),
            });
        }
        self.data
            .get(&spec.symbol)
            .cloned()
            .ok_or_else(|| SignalbenchError::NoData {
                symbol: spec.symbol.clone(),
                timeframe: spec.timeframe.to_string(),
            })
    }
}

pub fn hour(offset: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(offset as i64)
}

pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: hour(i as u32),
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(1000.0),
        })
        .collect()
}

pub fn make_signals(labels: &[&str]) -> Vec<SignalPoint> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| SignalPoint {
            timestamp: hour(i as u32),
            label: label.to_string(),
        })
        .collect()
}
