//! Evaluation orchestration.
//!
//! Wires a strategy, a candle source, the simulator and the metrics
//! calculator into one run, and fans independent runs out in parallel. A
//! run that fails — bad data, a strategy error, an input-shape violation —
//! becomes a `Failed` report; it never aborts or corrupts sibling runs.

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;

use super::candle::{align_to_grid, forward_fill_to_grid, time_grid};
use super::error::SignalbenchError;
use super::metrics::EvaluationMetrics;
use super::simulator::TradeSimulator;
use super::strategy::{AnchorSeries, SignalStrategy, StrategyMetadata};
use super::trade::Trade;
use crate::ports::data_port::CandleSource;

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            initial_capital: 1000.0,
            fee_rate: 0.001,
            start: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 5, 9)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub strategy: String,
    pub target_symbol: String,
    pub status: RunStatus,
    pub metrics: Option<EvaluationMetrics>,
    pub tradelog: Vec<Trade>,
}

impl EvaluationReport {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Evaluate one strategy, translating any error into a failed report.
pub fn evaluate_strategy(
    strategy: &dyn SignalStrategy,
    source: &dyn CandleSource,
    config: &EvaluationConfig,
) -> EvaluationReport {
    let meta = strategy.metadata();
    match run(strategy, &meta, source, config) {
        Ok((tradelog, metrics)) => EvaluationReport {
            strategy: strategy.name().to_string(),
            target_symbol: meta.target.symbol,
            status: RunStatus::Completed,
            metrics: Some(metrics),
            tradelog,
        },
        Err(err) => EvaluationReport {
            strategy: strategy.name().to_string(),
            target_symbol: meta.target.symbol,
            status: RunStatus::Failed {
                reason: err.to_string(),
            },
            metrics: None,
            tradelog: Vec::new(),
        },
    }
}

/// Evaluate a set of strategies in parallel. Runs are independent: each
/// owns its capital and position state, so ordering of the returned reports
/// matches the input regardless of scheduling.
pub fn evaluate_all(
    strategies: &[Box<dyn SignalStrategy>],
    source: &(dyn CandleSource + Sync),
    config: &EvaluationConfig,
) -> Vec<EvaluationReport> {
    strategies
        .par_iter()
        .map(|strategy| evaluate_strategy(strategy.as_ref(), source, config))
        .collect()
}

fn run(
    strategy: &dyn SignalStrategy,
    meta: &StrategyMetadata,
    source: &dyn CandleSource,
    config: &EvaluationConfig,
) -> Result<(Vec<Trade>, EvaluationMetrics), SignalbenchError> {
    let grid = time_grid(config.start, config.end, meta.target.timeframe);

    let target = align_to_grid(
        &source.fetch_candles(&meta.target, config.start, config.end)?,
        &grid,
    );

    // Anchors may run on a coarser timeframe; carry them onto the target
    // grid so every series is positionally aligned.
    let mut anchors = Vec::with_capacity(meta.anchors.len());
    for spec in &meta.anchors {
        let candles = source.fetch_candles(spec, config.start, config.end)?;
        anchors.push(AnchorSeries {
            spec: spec.clone(),
            candles: forward_fill_to_grid(&candles, &grid),
        });
    }

    let signals = strategy.generate_signals(&target, &anchors)?;
    if signals.len() != target.len() {
        return Err(SignalbenchError::SignalShapeMismatch {
            name: strategy.name().to_string(),
            expected: target.len(),
            got: signals.len(),
        });
    }

    let simulator = TradeSimulator::new(config.initial_capital, config.fee_rate);
    let tradelog = simulator.simulate(&target, &signals)?;
    let metrics = EvaluationMetrics::compute(&tradelog, config.initial_capital);
    Ok((tradelog, metrics))
}
