//! Candle representation and calendar-grid alignment.
//!
//! All series handed to the core are aligned to a fixed calendar grid: one
//! candle per grid slot, in timestamp order. Slots the exchange never
//! reported a bar for carry `None` fields.

use chrono::{Duration, NaiveDateTime};
use std::fmt;

/// Candle timeframes supported by the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol plus the timeframe its candles are requested at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetSpec {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl AssetSpec {
    pub fn new(symbol: &str, timeframe: Timeframe) -> Self {
        AssetSpec {
            symbol: symbol.to_uppercase(),
            timeframe,
        }
    }
}

/// One OHLCV observation on the calendar grid.
///
/// Fields are `None` for grid slots with no exchange data.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Candle {
    /// An empty candle marking a gap slot.
    pub fn gap(timestamp: NaiveDateTime) -> Self {
        Candle {
            timestamp,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }
}

/// Build the inclusive calendar grid from `start` to `end` at `timeframe`
/// spacing.
pub fn time_grid(start: NaiveDateTime, end: NaiveDateTime, timeframe: Timeframe) -> Vec<NaiveDateTime> {
    let step = timeframe.duration();
    let mut grid = Vec::new();
    let mut t = start;
    while t <= end {
        grid.push(t);
        t += step;
    }
    grid
}

/// Left-join candles onto a grid by exact timestamp.
///
/// Grid slots with no matching candle become gap candles. Candles outside the
/// grid are dropped. Input must be sorted by timestamp.
pub fn align_to_grid(candles: &[Candle], grid: &[NaiveDateTime]) -> Vec<Candle> {
    let mut aligned = Vec::with_capacity(grid.len());
    let mut i = 0;
    for &slot in grid {
        while i < candles.len() && candles[i].timestamp < slot {
            i += 1;
        }
        if i < candles.len() && candles[i].timestamp == slot {
            let mut c = candles[i].clone();
            c.timestamp = slot;
            aligned.push(c);
        } else {
            aligned.push(Candle::gap(slot));
        }
    }
    aligned
}

/// Resample candles onto a grid, carrying the most recent candle at or before
/// each slot forward (coarser anchor series onto the target grid).
///
/// Slots before the first candle become gap candles. Input must be sorted.
pub fn forward_fill_to_grid(candles: &[Candle], grid: &[NaiveDateTime]) -> Vec<Candle> {
    let mut filled = Vec::with_capacity(grid.len());
    let mut i = 0;
    let mut last: Option<&Candle> = None;
    for &slot in grid {
        while i < candles.len() && candles[i].timestamp <= slot {
            last = Some(&candles[i]);
            i += 1;
        }
        match last {
            Some(c) => {
                let mut carried = c.clone();
                carried.timestamp = slot;
                filled.push(carried);
            }
            None => filled.push(Candle::gap(slot)),
        }
    }
    filled
}
