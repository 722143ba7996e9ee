//! Anchor EMA momentum with local-extremum timing.
//!
//! The gate is anchor momentum: a short EMA above a long EMA on one (or all)
//! of the anchors, lagged one slot so the decision uses completed bars. With
//! the gate open, the strategy buys the target at a local price minimum and
//! sells at a local maximum. Entries and exits are tracked internally so a
//! minimum is only bought once per swing.

use crate::domain::candle::{AssetSpec, Candle, Timeframe};
use crate::domain::error::SignalbenchError;
use crate::domain::rolling::ema_span;
use crate::domain::signal::{Signal, SignalPoint};
use crate::domain::strategy::{AnchorSeries, SignalStrategy, StrategyMetadata};

/// Whether one bullish anchor suffices or all must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRule {
    Any,
    All,
}

#[derive(Debug, Clone)]
pub struct EmaPullbackParams {
    pub ema_short: usize,
    pub ema_long: usize,
    pub signal_lag: usize,
    pub anchor_rule: AnchorRule,
    pub anchor_symbols: Vec<String>,
}

impl Default for EmaPullbackParams {
    fn default() -> Self {
        EmaPullbackParams {
            ema_short: 9,
            ema_long: 21,
            signal_lag: 1,
            anchor_rule: AnchorRule::Any,
            anchor_symbols: vec!["BTC".to_string(), "ETH".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmaPullback {
    target: String,
    params: EmaPullbackParams,
}

impl Default for EmaPullback {
    fn default() -> Self {
        EmaPullback::new("LDO", EmaPullbackParams::default())
    }
}

impl EmaPullback {
    pub fn new(target: &str, params: EmaPullbackParams) -> Self {
        EmaPullback {
            target: target.to_uppercase(),
            params,
        }
    }

    fn min_bars(&self) -> usize {
        self.params.ema_long.max(3)
    }
}

impl SignalStrategy for EmaPullback {
    fn name(&self) -> &'static str {
        "ema-pullback"
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            target: AssetSpec::new(&self.target, Timeframe::H1),
            anchors: self
                .params
                .anchor_symbols
                .iter()
                .map(|symbol| AssetSpec::new(symbol, Timeframe::H1))
                .collect(),
        }
    }

    fn generate_signals(
        &self,
        target: &[Candle],
        anchors: &[AnchorSeries],
    ) -> Result<Vec<SignalPoint>, SignalbenchError> {
        let p = &self.params;
        let n = target.len();

        if n < self.min_bars() {
            return Err(SignalbenchError::InsufficientData {
                symbol: self.target.clone(),
                bars: n,
                minimum: self.min_bars(),
            });
        }

        // Per-anchor momentum, then the any/all combination, lagged.
        let mut bullish_per_anchor: Vec<Vec<bool>> = Vec::with_capacity(anchors.len());
        for series in anchors {
            let closes = series.closes();
            let short = ema_span(&closes, p.ema_short);
            let long = ema_span(&closes, p.ema_long);
            bullish_per_anchor.push(
                (0..n)
                    .map(|i| matches!((short[i], long[i]), (Some(s), Some(l)) if s > l))
                    .collect(),
            );
        }
        let combined: Vec<bool> = (0..n)
            .map(|i| match p.anchor_rule {
                AnchorRule::Any => bullish_per_anchor.iter().any(|b| b[i]),
                AnchorRule::All => {
                    !bullish_per_anchor.is_empty() && bullish_per_anchor.iter().all(|b| b[i])
                }
            })
            .collect();
        let gate: Vec<bool> = (0..n)
            .map(|i| i >= p.signal_lag && combined[i - p.signal_lag])
            .collect();

        let closes: Vec<Option<f64>> = target.iter().map(|c| c.close).collect();
        let minima = local_extrema(&closes, Extremum::Min);
        let maxima = local_extrema(&closes, Extremum::Max);

        let mut signals = Vec::with_capacity(n);
        let mut long = false;
        for i in 0..n {
            let signal = if !long && gate[i] && minima[i] {
                long = true;
                Signal::Buy
            } else if long && maxima[i] {
                long = false;
                Signal::Sell
            } else {
                Signal::Hold
            };
            signals.push(SignalPoint::new(target[i].timestamp, signal));
        }

        Ok(signals)
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

/// Strict local extrema against both immediate neighbours. Endpoints and
/// slots adjacent to gaps are never extrema.
fn local_extrema(closes: &[Option<f64>], kind: Extremum) -> Vec<bool> {
    (0..closes.len())
        .map(|i| {
            if i == 0 || i + 1 == closes.len() {
                return false;
            }
            match (closes[i - 1], closes[i], closes[i + 1]) {
                (Some(prev), Some(curr), Some(next)) => match kind {
                    Extremum::Min => curr < prev && curr < next,
                    Extremum::Max => curr > prev && curr > next,
                },
                _ => false,
            }
        })
        .collect()
}
