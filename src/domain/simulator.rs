//! Trade execution simulation.
//!
//! A single left-to-right fold over timestamp-aligned candles and signals.
//! The account holds at most one open long position; fees are proportional
//! and charged against running capital on both entry and exit, so gains
//! compound on a fully reinvested basis. Any position still open after the
//! last tick is force-liquidated at the final close, so the trade log never
//! ends with an open position.

use std::collections::BTreeSet;

use super::candle::Candle;
use super::error::SignalbenchError;
use super::signal::{Signal, SignalPoint};
use super::trade::Trade;

#[derive(Debug, Clone)]
pub struct TradeSimulator {
    initial_capital: f64,
    fee_rate: f64,
}

impl Default for TradeSimulator {
    fn default() -> Self {
        TradeSimulator {
            initial_capital: 1000.0,
            fee_rate: 0.001,
        }
    }
}

impl TradeSimulator {
    /// `fee_rate` is the proportional fee per fill; a round trip pays it
    /// twice.
    pub fn new(initial_capital: f64, fee_rate: f64) -> Self {
        TradeSimulator {
            initial_capital,
            fee_rate,
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Fold candles and signals into the ordered log of completed trades.
    ///
    /// Fails up front, producing no partial output, when the series lengths
    /// differ or any signal label falls outside {BUY, SELL, HOLD}. A BUY
    /// while long and a SELL while flat are no-ops; HOLD never changes
    /// state. Entries and exits require a close price; a BUY or SELL landing
    /// on a gap slot leaves the position unchanged.
    pub fn simulate(
        &self,
        candles: &[Candle],
        signals: &[SignalPoint],
    ) -> Result<Vec<Trade>, SignalbenchError> {
        let parsed = validate(candles, signals)?;

        let mut capital = self.initial_capital;
        let mut entry_price: Option<f64> = None;
        let mut tradelog = Vec::new();

        for (candle, signal) in candles.iter().zip(parsed) {
            match signal {
                Signal::Buy if entry_price.is_none() => {
                    if let Some(close) = candle.close {
                        entry_price = Some(close);
                        capital *= 1.0 - self.fee_rate;
                    }
                }
                Signal::Sell => {
                    if let (Some(entry), Some(exit)) = (entry_price, candle.close) {
                        capital = close_position(
                            &mut tradelog,
                            capital,
                            self.fee_rate,
                            entry,
                            exit,
                            candle.timestamp,
                        );
                        entry_price = None;
                    }
                }
                _ => {}
            }
        }

        // Forced end-of-horizon liquidation. When the final close is missing
        // the position exits at its entry price, a zero-return trade.
        if let (Some(entry), Some(last)) = (entry_price, candles.last()) {
            let exit = last.close.unwrap_or(entry);
            close_position(
                &mut tradelog,
                capital,
                self.fee_rate,
                entry,
                exit,
                last.timestamp,
            );
        }

        Ok(tradelog)
    }
}

/// Check both preconditions and parse the labels in one pass.
fn validate(
    candles: &[Candle],
    signals: &[SignalPoint],
) -> Result<Vec<Signal>, SignalbenchError> {
    if candles.len() != signals.len() {
        return Err(SignalbenchError::LengthMismatch {
            candles: candles.len(),
            signals: signals.len(),
        });
    }

    let mut parsed = Vec::with_capacity(signals.len());
    let mut invalid = BTreeSet::new();
    for point in signals {
        match Signal::parse(&point.label) {
            Some(signal) => parsed.push(signal),
            None => {
                invalid.insert(point.label.clone());
            }
        }
    }

    if !invalid.is_empty() {
        return Err(SignalbenchError::InvalidSignal {
            invalid: invalid.into_iter().collect(),
        });
    }
    Ok(parsed)
}

fn close_position(
    tradelog: &mut Vec<Trade>,
    capital: f64,
    fee_rate: f64,
    entry_price: f64,
    exit_price: f64,
    timestamp: chrono::NaiveDateTime,
) -> f64 {
    let trade_return = (exit_price - entry_price) / entry_price;
    let mut capital = capital + capital * trade_return;
    capital *= 1.0 - fee_rate;

    tradelog.push(Trade {
        timestamp,
        entry_price,
        exit_price,
        pnl: trade_return,
        capital_after: capital,
    });
    capital
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: ts(i as u32),
                open: Some(close),
                high: Some(close),
                low: Some(close),
                close: Some(close),
                volume: Some(1000.0),
            })
            .collect()
    }

    fn signals(labels: &[&str]) -> Vec<SignalPoint> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| SignalPoint {
                timestamp: ts(i as u32),
                label: label.to_string(),
            })
            .collect()
    }

    #[test]
    fn buy_then_sell_records_one_trade() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let log = sim
            .simulate(
                &candles(&[100.0, 110.0, 105.0, 120.0]),
                &signals(&["HOLD", "BUY", "HOLD", "SELL"]),
            )
            .unwrap();

        assert_eq!(log.len(), 1);
        let trade = &log[0];
        assert!((trade.entry_price - 110.0).abs() < f64::EPSILON);
        assert!((trade.exit_price - 120.0).abs() < f64::EPSILON);
        assert!((trade.pnl - 10.0 / 110.0).abs() < 1e-12);
        assert!((trade.capital_after - 1000.0 * (120.0 / 110.0)).abs() < 1e-9);
        assert_eq!(trade.timestamp, ts(3));
    }

    #[test]
    fn length_mismatch_fails_fast() {
        let sim = TradeSimulator::default();
        let err = sim
            .simulate(&candles(&[100.0, 110.0]), &signals(&["BUY"]))
            .unwrap_err();
        assert!(matches!(
            err,
            SignalbenchError::LengthMismatch {
                candles: 2,
                signals: 1
            }
        ));
    }

    #[test]
    fn invalid_labels_are_collected_and_sorted() {
        let sim = TradeSimulator::default();
        let err = sim
            .simulate(
                &candles(&[100.0, 110.0, 120.0, 130.0]),
                &signals(&["BUY", "WAIT", "MAYBE", "WAIT"]),
            )
            .unwrap_err();

        match err {
            SignalbenchError::InvalidSignal { invalid } => {
                assert_eq!(invalid, vec!["MAYBE".to_string(), "WAIT".to_string()]);
            }
            other => panic!("expected InvalidSignal, got {other:?}"),
        }
    }

    #[test]
    fn labels_are_case_insensitive() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let log = sim
            .simulate(&candles(&[100.0, 110.0]), &signals(&["buy", "Sell"]))
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn buy_while_long_is_noop() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let log = sim
            .simulate(
                &candles(&[100.0, 90.0, 120.0]),
                &signals(&["BUY", "BUY", "SELL"]),
            )
            .unwrap();

        // The second BUY neither re-enters nor averages down.
        assert_eq!(log.len(), 1);
        assert!((log[0].entry_price - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_while_flat_is_noop() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let log = sim
            .simulate(&candles(&[100.0, 110.0]), &signals(&["SELL", "HOLD"]))
            .unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn all_hold_produces_empty_log() {
        let sim = TradeSimulator::new(1000.0, 0.001);
        let log = sim
            .simulate(
                &candles(&[100.0, 110.0, 105.0]),
                &signals(&["HOLD", "HOLD", "HOLD"]),
            )
            .unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn open_position_is_liquidated_at_last_close() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let log = sim
            .simulate(&candles(&[100.0, 110.0]), &signals(&["BUY", "HOLD"]))
            .unwrap();

        assert_eq!(log.len(), 1);
        assert!((log[0].exit_price - 110.0).abs() < f64::EPSILON);
        assert!((log[0].pnl - 0.1).abs() < 1e-12);
        assert!((log[0].capital_after - 1100.0).abs() < 1e-9);
        assert_eq!(log[0].timestamp, ts(1));
    }

    #[test]
    fn liquidation_falls_back_to_entry_price_on_missing_close() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let mut series = candles(&[100.0, 110.0]);
        series[1].close = None;

        let log = sim
            .simulate(&series, &signals(&["BUY", "HOLD"]))
            .unwrap();

        assert_eq!(log.len(), 1);
        assert!((log[0].exit_price - 100.0).abs() < f64::EPSILON);
        assert!((log[0].pnl - 0.0).abs() < f64::EPSILON);
        assert!((log[0].capital_after - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_and_exit_each_charge_a_fee() {
        let fee = 0.001;
        let sim = TradeSimulator::new(1000.0, fee);
        let log = sim
            .simulate(
                &candles(&[100.0, 110.0, 105.0, 120.0]),
                &signals(&["HOLD", "BUY", "HOLD", "SELL"]),
            )
            .unwrap();

        let expected = 1000.0 * (1.0 - fee) * (120.0 / 110.0) * (1.0 - fee);
        assert!((log[0].capital_after - expected).abs() < 1e-9);
    }

    #[test]
    fn fees_compound_across_trades() {
        let fee = 0.01;
        let sim = TradeSimulator::new(1000.0, fee);
        let log = sim
            .simulate(
                &candles(&[100.0, 100.0, 100.0, 100.0]),
                &signals(&["BUY", "SELL", "BUY", "SELL"]),
            )
            .unwrap();

        // Two flat round trips, four fee applications.
        assert_eq!(log.len(), 2);
        let expected = 1000.0 * (1.0 - fee).powi(4);
        assert!((log[1].capital_after - expected).abs() < 1e-9);
    }

    #[test]
    fn buy_on_gap_slot_does_not_enter() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let mut series = candles(&[100.0, 110.0, 120.0]);
        series[0].close = None;

        let log = sim
            .simulate(&series, &signals(&["BUY", "BUY", "SELL"]))
            .unwrap();

        // The first BUY cannot fill; the second does.
        assert_eq!(log.len(), 1);
        assert!((log[0].entry_price - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_on_gap_slot_stays_long_until_liquidation() {
        let sim = TradeSimulator::new(1000.0, 0.0);
        let mut series = candles(&[100.0, 110.0, 130.0]);
        series[1].close = None;

        let log = sim
            .simulate(&series, &signals(&["BUY", "SELL", "HOLD"]))
            .unwrap();

        assert_eq!(log.len(), 1);
        assert!((log[0].exit_price - 130.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_yields_empty_log() {
        let sim = TradeSimulator::default();
        let log = sim.simulate(&[], &[]).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn simulate_is_deterministic() {
        let sim = TradeSimulator::new(1000.0, 0.001);
        let series = candles(&[100.0, 110.0, 105.0, 120.0, 90.0]);
        let sigs = signals(&["BUY", "HOLD", "SELL", "BUY", "HOLD"]);

        let a = sim.simulate(&series, &sigs).unwrap();
        let b = sim.simulate(&series, &sigs).unwrap();
        assert_eq!(a, b);
    }
}
