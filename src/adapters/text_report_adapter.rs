//! Plain-text report adapter.
//!
//! Writes one summary file and one trade-log CSV per evaluation report.
//! The summary block is the same one the CLI prints to stderr.

use std::fs;
use std::path::Path;

use crate::domain::error::SignalbenchError;
use crate::domain::evaluation::{EvaluationReport, RunStatus};
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

/// Render the console/file summary block for one report.
pub fn render_summary(report: &EvaluationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} ({}) ===\n",
        report.strategy, report.target_symbol
    ));

    match &report.status {
        RunStatus::Failed { reason } => {
            out.push_str("Status:           failed\n");
            out.push_str(&format!("Reason:           {reason}\n"));
            return out;
        }
        RunStatus::Completed => {
            out.push_str("Status:           completed\n");
        }
    }

    let Some(m) = &report.metrics else {
        return out;
    };

    out.push_str(&format!("Total Return:     {:.2}%\n", m.return_percentage));
    out.push_str(&format!(
        "Max Drawdown:     -{:.2}%\n",
        m.max_drawdown_percentage
    ));
    out.push_str(&format!("Sharpe Ratio:     {:.2}\n", m.sharpe_ratio));
    out.push_str(&format!("Sortino Ratio:    {:.2}\n", m.sortino_ratio));
    out.push_str(&format!("Calmar Ratio:     {:.2}\n", m.calmar_ratio));
    out.push_str(&format!("Total Trades:     {}\n", m.total_trades));
    out.push_str(&format!("Win Rate:         {:.1}%\n", m.win_rate * 100.0));
    out.push_str(&format!("Profit Factor:    {:.2}\n", m.profit_factor));
    out.push_str(&format!(
        "Avg Win / Loss:   {:.4} / {:.4}\n",
        m.avg_win, m.avg_loss
    ));
    out.push_str(&format!(
        "Longest Streaks:  {} wins, {} losses\n",
        m.max_consecutive_wins, m.max_consecutive_losses
    ));
    out.push_str(&format!(
        "Drawdowns:        {} (avg {:.1}, max {} trades)\n",
        m.drawdown_count, m.avg_drawdown_duration_trades, m.max_drawdown_duration_trades
    ));
    out.push_str(&format!(
        "Trade Timing:     {:.1} h/trade, {:.2} trades/day\n",
        m.avg_trade_duration_hours, m.trades_per_day
    ));
    out.push_str(&format!("Final Capital:    {:.2}\n", m.final_capital));
    out
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        reports: &[EvaluationReport],
        output_dir: &Path,
    ) -> Result<(), SignalbenchError> {
        fs::create_dir_all(output_dir)?;

        for report in reports {
            let summary_path = output_dir.join(format!("{}_summary.txt", report.strategy));
            fs::write(&summary_path, render_summary(report))?;

            let trades_path = output_dir.join(format!("{}_trades.csv", report.strategy));
            let mut wtr =
                csv::Writer::from_path(&trades_path).map_err(|e| SignalbenchError::Cache {
                    reason: format!("failed to open {}: {}", trades_path.display(), e),
                })?;
            wtr.write_record(["timestamp", "entry_price", "exit_price", "pnl", "capital_after"])
                .map_err(csv_error)?;
            for trade in &report.tradelog {
                wtr.write_record([
                    trade.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    trade.entry_price.to_string(),
                    trade.exit_price.to_string(),
                    trade.pnl.to_string(),
                    trade.capital_after.to_string(),
                ])
                .map_err(csv_error)?;
            }
            wtr.flush()?;
        }
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> SignalbenchError {
    SignalbenchError::Cache {
        reason: format!("trade log write failed: {e}"),
    }
}
