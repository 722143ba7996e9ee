//! CSV candle cache.
//!
//! One file per asset, `{symbol}_{timeframe}.csv`, columns
//! `timestamp,open,high,low,close,volume` with empty cells for gap slots.
//! Doubles as an offline `CandleSource` for cached or hand-supplied data.

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::candle::{AssetSpec, Candle};
use crate::domain::error::SignalbenchError;
use crate::ports::data_port::CandleSource;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvCacheAdapter {
    base_path: PathBuf,
}

impl CsvCacheAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn cache_path(&self, spec: &AssetSpec) -> PathBuf {
        self.base_path.join(format!(
            "{}_{}.csv",
            spec.symbol.to_lowercase(),
            spec.timeframe
        ))
    }

    pub fn contains(&self, spec: &AssetSpec) -> bool {
        self.cache_path(spec).exists()
    }

    /// Load all cached candles for an asset, sorted by timestamp.
    pub fn load(&self, spec: &AssetSpec) -> Result<Vec<Candle>, SignalbenchError> {
        let path = self.cache_path(spec);
        let content = fs::read_to_string(&path).map_err(|e| SignalbenchError::Cache {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SignalbenchError::Cache {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let timestamp_str = record.get(0).ok_or_else(|| SignalbenchError::Cache {
                reason: "missing timestamp column".to_string(),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
                .map_err(|e| SignalbenchError::Cache {
                    reason: format!("invalid timestamp {timestamp_str}: {e}"),
                })?;

            candles.push(Candle {
                timestamp,
                open: parse_field(&record, 1)?,
                high: parse_field(&record, 2)?,
                low: parse_field(&record, 3)?,
                close: parse_field(&record, 4)?,
                volume: parse_field(&record, 5)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Write candles for an asset, replacing any existing file.
    pub fn store(&self, spec: &AssetSpec, candles: &[Candle]) -> Result<(), SignalbenchError> {
        fs::create_dir_all(&self.base_path).map_err(|e| SignalbenchError::Cache {
            reason: format!(
                "failed to create cache dir {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let path = self.cache_path(spec);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| SignalbenchError::Cache {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])
            .map_err(write_error)?;
        for candle in candles {
            wtr.write_record([
                candle.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                format_field(candle.open),
                format_field(candle.high),
                format_field(candle.low),
                format_field(candle.close),
                format_field(candle.volume),
            ])
            .map_err(write_error)?;
        }
        wtr.flush().map_err(|e| SignalbenchError::Cache {
            reason: format!("flush failed: {e}"),
        })?;
        Ok(())
    }
}

impl CandleSource for CsvCacheAdapter {
    fn fetch_candles(
        &self,
        spec: &AssetSpec,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SignalbenchError> {
        if !self.contains(spec) {
            return Err(SignalbenchError::NoData {
                symbol: spec.symbol.clone(),
                timeframe: spec.timeframe.to_string(),
            });
        }
        let mut candles = self.load(spec)?;
        candles.retain(|c| c.timestamp >= start && c.timestamp <= end);
        Ok(candles)
    }
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
) -> Result<Option<f64>, SignalbenchError> {
    match record.get(index) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|e| SignalbenchError::Cache {
                reason: format!("invalid numeric value {raw:?}: {e}"),
            }),
    }
}

fn format_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_error(e: csv::Error) -> SignalbenchError {
    SignalbenchError::Cache {
        reason: format!("write failed: {e}"),
    }
}
