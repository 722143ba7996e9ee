//! Trading signal labels.
//!
//! A signal is one per-timestamp instruction in {BUY, SELL, HOLD}, matched
//! positionally against the candle series. Labels arrive as raw strings from
//! signal producers and are parsed case-insensitively; anything outside the
//! domain is a hard input error at the simulator boundary.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Parse a label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Signal> {
        match label.trim().to_uppercase().as_str() {
            "BUY" => Some(Signal::Buy),
            "SELL" => Some(Signal::Sell),
            "HOLD" => Some(Signal::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

/// One labelled slot of a signal series.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub timestamp: NaiveDateTime,
    pub label: String,
}

impl SignalPoint {
    pub fn new(timestamp: NaiveDateTime, signal: Signal) -> Self {
        SignalPoint {
            timestamp,
            label: signal.as_str().to_string(),
        }
    }
}
