//! Performance metrics and statistics.
//!
//! All statistics derive from the completed trade log plus initial capital.
//! The capital curve is trade-indexed, not candle-indexed: drawdowns are
//! measured between consecutive closed trades, and drawdown durations count
//! trades. Sharpe is `mean(pnl) / std(pnl)` over per-trade decimal returns
//! rather than a resampled periodic series; `sortino_ratio` is an alias of
//! it and `calmar_ratio` divides total return by the drawdown percentage.
//! These simplifications are inherited from the evaluation design this
//! engine reproduces (see DESIGN.md).

use super::trade::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub return_percentage: f64,
    pub max_drawdown_percentage: f64,
    pub avg_return: f64,
    pub return_std: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub drawdown_count: usize,
    pub avg_drawdown_duration_trades: f64,
    pub max_drawdown_duration_trades: usize,
    pub avg_trade_duration_hours: f64,
    pub trades_per_day: f64,
}

impl EvaluationMetrics {
    /// Compute the full bundle. Never fails: an empty or degenerate trade
    /// log yields zeroed statistics with `final_capital == initial_capital`.
    pub fn compute(tradelog: &[Trade], initial_capital: f64) -> Self {
        let total_trades = tradelog.len();

        let final_capital = tradelog
            .last()
            .map(|t| t.capital_after)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_capital - initial_capital) / initial_capital
        } else {
            0.0
        };

        let capitals: Vec<f64> = tradelog.iter().map(|t| t.capital_after).collect();
        let drawdowns = drawdown_series(&capitals);
        let max_drawdown_percentage = drawdowns
            .iter()
            .copied()
            .fold(0.0_f64, f64::min)
            .abs()
            * 100.0;

        let pnls: Vec<f64> = tradelog.iter().map(|t| t.pnl).collect();
        let (avg_return, return_std) = mean_and_std(&pnls);

        let sharpe_ratio = if return_std > 0.0 {
            avg_return / return_std
        } else {
            0.0
        };

        let calmar_ratio = if total_trades == 0 {
            0.0
        } else if max_drawdown_percentage > 0.0 {
            total_return / max_drawdown_percentage
        } else {
            f64::INFINITY
        };

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_wins = 0.0_f64;
        let mut gross_losses = 0.0_f64;
        for &pnl in &pnls {
            if pnl > 0.0 {
                wins += 1;
                gross_wins += pnl;
            } else if pnl < 0.0 {
                losses += 1;
                gross_losses += pnl;
            }
        }

        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64
        } else {
            0.0
        };

        let avg_win = if wins > 0 { gross_wins / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 {
            gross_losses / losses as f64
        } else {
            0.0
        };

        let profit_factor = if gross_losses < 0.0 {
            (gross_wins / gross_losses).abs()
        } else if gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let (max_consecutive_wins, max_consecutive_losses) = longest_streaks(&pnls);

        let (drawdown_count, avg_drawdown_duration_trades, max_drawdown_duration_trades) =
            drawdown_runs(&drawdowns);

        let (avg_trade_duration_hours, trades_per_day) = trade_timing(tradelog);

        EvaluationMetrics {
            initial_capital,
            final_capital,
            total_return,
            return_percentage: total_return * 100.0,
            max_drawdown_percentage,
            avg_return,
            return_std,
            sharpe_ratio,
            sortino_ratio: sharpe_ratio,
            calmar_ratio,
            total_trades,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            max_consecutive_wins,
            max_consecutive_losses,
            drawdown_count,
            avg_drawdown_duration_trades,
            max_drawdown_duration_trades,
            avg_trade_duration_hours,
            trades_per_day,
        }
    }
}

/// Fractional decline of each capital point from its running peak.
fn drawdown_series(capitals: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    capitals
        .iter()
        .map(|&capital| {
            if capital > peak {
                peak = capital;
            }
            capital / peak - 1.0
        })
        .collect()
}

/// Mean and population standard deviation (ddof = 0).
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Longest run of winning and of losing trades over the interleaved trade
/// order. Breakeven trades break both runs.
fn longest_streaks(pnls: &[f64]) -> (usize, usize) {
    let mut max_wins = 0usize;
    let mut max_losses = 0usize;
    let mut current_wins = 0usize;
    let mut current_losses = 0usize;

    for &pnl in pnls {
        if pnl > 0.0 {
            current_wins += 1;
            current_losses = 0;
        } else if pnl < 0.0 {
            current_losses += 1;
            current_wins = 0;
        } else {
            current_wins = 0;
            current_losses = 0;
        }
        max_wins = max_wins.max(current_wins);
        max_losses = max_losses.max(current_losses);
    }

    (max_wins, max_losses)
}

/// Group contiguous in-drawdown trade indices into runs; report run count,
/// mean run length, and max run length, all in trades.
fn drawdown_runs(drawdowns: &[f64]) -> (usize, f64, usize) {
    let mut count = 0usize;
    let mut total_len = 0usize;
    let mut max_len = 0usize;
    let mut current = 0usize;

    for &dd in drawdowns {
        if dd < 0.0 {
            if current == 0 {
                count += 1;
            }
            current += 1;
            total_len += 1;
            max_len = max_len.max(current);
        } else {
            current = 0;
        }
    }

    let avg = if count > 0 {
        total_len as f64 / count as f64
    } else {
        0.0
    };
    (count, avg, max_len)
}

/// Average hours per trade and trades per day, measured over the wall-time
/// span between the first and last trade exits. Both are 0 when the span is
/// zero.
fn trade_timing(tradelog: &[Trade]) -> (f64, f64) {
    let (Some(first), Some(last)) = (tradelog.first(), tradelog.last()) else {
        return (0.0, 0.0);
    };
    let elapsed_hours = (last.timestamp - first.timestamp).num_seconds() as f64 / 3600.0;
    if elapsed_hours <= 0.0 {
        return (0.0, 0.0);
    }
    let total = tradelog.len() as f64;
    (elapsed_hours / total, total / (elapsed_hours / 24.0))
}
