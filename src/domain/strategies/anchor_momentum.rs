//! Weighted anchor-return momentum strategy.
//!
//! Watches a basket of anchor assets: when their weighted hourly return,
//! lagged by a few slots, clears a threshold in either direction and the
//! target confirms (same-sign hourly return, close on the right side of its
//! SMA), emits BUY or SELL. Anchor volatility and a volume-ratio gate filter
//! out dead tape. Signals are stateless per slot; the simulator resolves
//! them against its position state.

use crate::domain::candle::{AssetSpec, Candle, Timeframe};
use crate::domain::error::SignalbenchError;
use crate::domain::rolling::{pct_change, rolling_mean, rolling_std, shift};
use crate::domain::signal::{Signal, SignalPoint};
use crate::domain::strategy::{
    anchor_by_symbol, AnchorSeries, SignalStrategy, StrategyMetadata,
};

#[derive(Debug, Clone)]
pub struct AnchorMomentumParams {
    pub threshold: f64,
    pub lag: usize,
    pub sma_window: usize,
    pub vol_window: usize,
    pub volume_window: usize,
    pub min_volume_ratio: f64,
    pub min_volatility: f64,
    /// Anchor symbols and their weights in the basket return.
    pub weights: Vec<(String, f64)>,
}

impl Default for AnchorMomentumParams {
    fn default() -> Self {
        AnchorMomentumParams {
            threshold: 0.02,
            lag: 6,
            sma_window: 5,
            vol_window: 6,
            volume_window: 12,
            min_volume_ratio: 0.7,
            min_volatility: 0.02,
            weights: vec![
                ("BTC".to_string(), 0.2),
                ("ETH".to_string(), 0.2),
                ("SOL".to_string(), 0.6),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnchorMomentum {
    target: String,
    params: AnchorMomentumParams,
}

impl Default for AnchorMomentum {
    fn default() -> Self {
        AnchorMomentum::new("RAY", AnchorMomentumParams::default())
    }
}

impl AnchorMomentum {
    pub fn new(target: &str, params: AnchorMomentumParams) -> Self {
        AnchorMomentum {
            target: target.to_uppercase(),
            params,
        }
    }
}

impl SignalStrategy for AnchorMomentum {
    fn name(&self) -> &'static str {
        "anchor-momentum"
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            target: AssetSpec::new(&self.target, Timeframe::H1),
            anchors: self
                .params
                .weights
                .iter()
                .map(|(symbol, _)| AssetSpec::new(symbol, Timeframe::H1))
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

        let anchor_closes: Vec<Vec<Option<f64>>> = p
            .weights
            .iter()
            .map(|(symbol, _)| Ok(anchor_by_symbol(anchors, symbol)?.closes()))
            .collect::<Result<_, SignalbenchError>>()?;
        let anchor_volumes: Vec<Vec<Option<f64>>> = p
            .weights
            .iter()
            .map(|(symbol, _)| Ok(anchor_by_symbol(anchors, symbol)?.volumes()))
            .collect::<Result<_, SignalbenchError>>()?;

        // Weighted basket return, defined only where every anchor has one.
        let anchor_returns: Vec<Vec<Option<f64>>> =
            anchor_closes.iter().map(|c| pct_change(c, 1)).collect();
        let basket: Vec<Option<f64>> = (0..n)
            .map(|i| {
                p.weights
                    .iter()
                    .zip(&anchor_returns)
                    .map(|((_, weight), rets)| rets.get(i).copied().flatten().map(|r| weight * r))
                    .sum::<Option<f64>>()
            })
            .collect();
        let basket_lagged = shift(&basket, p.lag);

        let target_closes: Vec<Option<f64>> = target.iter().map(|c| c.close).collect();
        let target_return = pct_change(&target_closes, 1);
        let sma = rolling_mean(&target_closes, p.sma_window);

        // Mean anchor volatility and volume ratio across the basket.
        let anchor_stds: Vec<Vec<Option<f64>>> = anchor_closes
            .iter()
            .map(|c| rolling_std(c, p.vol_window))
            .collect();
        let anchor_avg_volumes: Vec<Vec<Option<f64>>> = anchor_volumes
            .iter()
            .map(|v| rolling_mean(v, p.volume_window))
            .collect();

        let mut signals = Vec::with_capacity(n);
        for i in 0..n {
            let volatility = mean_at(&anchor_stds, i);
            let volume_ratio = match (
                mean_at(&anchor_volumes, i),
                mean_at(&anchor_avg_volumes, i),
            ) {
                (Some(now), Some(avg)) => Some(now / (avg + 1e-9)),
                _ => None,
            };

            let gates_open = matches!(volatility, Some(v) if v > p.min_volatility)
                && matches!(volume_ratio, Some(r) if r > p.min_volume_ratio);

            let signal = match (basket_lagged[i], target_return[i], target_closes[i], sma[i]) {
                (Some(basket), Some(ret), Some(close), Some(sma)) if gates_open => {
                    if basket > p.threshold && ret > 0.0 && close > sma {
                        Signal::Buy
                    } else if basket < -p.threshold && ret < 0.0 && close < sma {
                        Signal::Sell
                    } else {
                        Signal::Hold
                    }
                }
                _ => Signal::Hold,
            };
            signals.push(SignalPoint::new(target[i].timestamp, signal));
        }

        Ok(signals)
    }
}

/// Mean of the i-th value across several series, if all are present.
fn mean_at(series: &[Vec<Option<f64>>], i: usize) -> Option<f64> {
    let sum: Option<f64> = series.iter().map(|s| s.get(i).copied().flatten()).sum();
    sum.map(|s| s / series.len() as f64)
}
