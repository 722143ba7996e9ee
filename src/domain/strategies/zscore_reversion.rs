//! Anchor-triggered entry with z-score mean-reversion exit.
//!
//! Entries require every anchor's lagged return to clear its own threshold
//! while none sits below its rolling tail quantile (a crash veto). Open
//! positions exit on a volatility-scaled stop or target, or when the target's
//! close z-score falls back through the exit threshold from above. This
//! strategy tracks its own position state so the exit logic can reference
//! the entry price; the simulator remains the authority on fills.

use crate::domain::candle::{AssetSpec, Candle, Timeframe};
use crate::domain::error::SignalbenchError;
use crate::domain::rolling::{
    forward_fill, pct_change, rolling_mean, rolling_quantile, rolling_std, shift,
};
use crate::domain::signal::{Signal, SignalPoint};
use crate::domain::strategy::{
    anchor_by_symbol, AnchorSeries, SignalStrategy, StrategyMetadata,
};

#[derive(Debug, Clone)]
pub struct ZscoreReversionParams {
    pub lag: usize,
    pub stop_multiplier: f64,
    pub risk_reward_ratio: f64,
    pub zscore_window: usize,
    pub zscore_threshold: f64,
    pub vol_window: usize,
    pub tail_window: usize,
    pub tail_quantile: f64,
    /// Anchor symbols (4h candles) and their per-anchor return thresholds.
    pub anchor_thresholds: Vec<(String, f64)>,
}

impl Default for ZscoreReversionParams {
    fn default() -> Self {
        ZscoreReversionParams {
            lag: 1,
            stop_multiplier: 2.4,
            risk_reward_ratio: 3.9,
            zscore_window: 24,
            zscore_threshold: 2.3,
            vol_window: 24,
            tail_window: 25,
            tail_quantile: 0.66,
            anchor_thresholds: vec![
                ("ETH".to_string(), 0.021),
                ("SOL".to_string(), 0.023),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZscoreReversion {
    target: String,
    params: ZscoreReversionParams,
}

impl Default for ZscoreReversion {
    fn default() -> Self {
        ZscoreReversion::new("RSR", ZscoreReversionParams::default())
    }
}

impl ZscoreReversion {
    pub fn new(target: &str, params: ZscoreReversionParams) -> Self {
        ZscoreReversion {
            target: target.to_uppercase(),
            params,
        }
    }
}

impl SignalStrategy for ZscoreReversion {
    fn name(&self) -> &'static str {
        "zscore-reversion"
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            target: AssetSpec::new(&self.target, Timeframe::H1),
            anchors: self
                .params
                .anchor_thresholds
                .iter()
                .map(|(symbol, _)| AssetSpec::new(symbol, Timeframe::H4))
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

        // Per-anchor lagged returns (forward-filled across the coarser
        // anchor grid) and their rolling tail quantiles.
        let mut anchor_returns = Vec::with_capacity(p.anchor_thresholds.len());
        let mut anchor_tails = Vec::with_capacity(p.anchor_thresholds.len());
        for (symbol, _) in &p.anchor_thresholds {
            let closes = anchor_by_symbol(anchors, symbol)?.closes();
            let ret = forward_fill(&shift(&pct_change(&closes, 1), p.lag));
            anchor_tails.push(rolling_quantile(&ret, p.tail_window, p.tail_quantile));
            anchor_returns.push(ret);
        }

        let closes: Vec<Option<f64>> = target.iter().map(|c| c.close).collect();
        let highs: Vec<Option<f64>> = target.iter().map(|c| c.high).collect();

        // Relative volatility: std of highs over mean close.
        let high_std = rolling_std(&highs, p.vol_window);
        let close_mean = rolling_mean(&closes, p.vol_window);
        let volatility: Vec<Option<f64>> = (0..n)
            .map(|i| match (high_std[i], close_mean[i]) {
                (Some(std), Some(mean)) if mean != 0.0 => Some(std / mean),
                _ => None,
            })
            .collect();

        let zscore_mean = rolling_mean(&closes, p.zscore_window);
        let zscore_std = rolling_std(&closes, p.zscore_window);
        let zscore: Vec<Option<f64>> = (0..n)
            .map(|i| match (closes[i], zscore_mean[i], zscore_std[i]) {
                (Some(close), Some(mean), Some(std)) if std > 0.0 => Some((close - mean) / std),
                _ => None,
            })
            .collect();
        let zscore = forward_fill(&zscore);

        let mut signals = Vec::with_capacity(n);
        let mut entry_price: Option<f64> = None;
        let mut prev_zscore: Option<f64> = None;

        for i in 0..n {
            let current_zscore = zscore[i].unwrap_or(0.0);

            let signal = if let Some(entry) = entry_price {
                let stop_hit = match (closes[i], volatility[i]) {
                    (Some(close), Some(vol)) => {
                        let move_pct = (close - entry) / entry;
                        let stop_level = p.stop_multiplier * vol;
                        move_pct < -stop_level || move_pct > stop_level * p.risk_reward_ratio
                    }
                    _ => false,
                };
                let zscore_exit = matches!(
                    prev_zscore,
                    Some(prev) if prev > p.zscore_threshold && current_zscore <= p.zscore_threshold
                );

                if (stop_hit || zscore_exit) && closes[i].is_some() {
                    entry_price = None;
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            } else {
                let triggers = p.anchor_thresholds.iter().enumerate().all(
                    |(a, (_, threshold))| {
                        matches!(anchor_returns[a][i], Some(ret) if ret > *threshold)
                    },
                );
                let tail_risk = anchor_returns.iter().zip(&anchor_tails).any(|(ret, tail)| {
                    matches!(
                        (ret[i], tail[i]),
                        (Some(ret), Some(tail)) if ret < tail
                    )
                });

                if triggers && !tail_risk && closes[i].is_some() {
                    entry_price = closes[i];
                    Signal::Buy
                } else {
                    Signal::Hold
                }
            };

            prev_zscore = Some(current_zscore);
            signals.push(SignalPoint::new(target[i].timestamp, signal));
        }

        Ok(signals)
    }
}
