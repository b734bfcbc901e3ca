//! Performance metrics and trade statistics.
//!
//! Returns and drawdowns are expressed in percent (10.0 == 10%).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::trade::Trade;

const DAYS_PER_YEAR: f64 = 365.0;

/// (final - initial) / initial * 100
pub fn total_return_pct(initial_capital: f64, final_equity: f64) -> f64 {
    (final_equity - initial_capital) / initial_capital * 100.0
}

/// Whole days between two timestamps, never less than 1.
pub fn span_days(first: NaiveDateTime, last: NaiveDateTime) -> i64 {
    (last - first).num_days().max(1)
}

/// Compound `total_return_pct` earned over `span_days` up to a 365-day year.
pub fn annualized_return_pct(total_return_pct: f64, span_days: i64) -> f64 {
    let growth = 1.0 + total_return_pct / 100.0;
    (growth.powf(DAYS_PER_YEAR / span_days as f64) - 1.0) * 100.0
}

/// Largest peak-to-trough decline in percent.
///
/// Points reached while the running peak is not positive are skipped.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in equity_curve {
        peak = peak.max(value);
        if peak <= 0.0 {
            continue;
        }
        let dd = (peak - value) / peak * 100.0;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub count: usize,
    pub win_rate_pct: f64,
    pub avg_return_pct: f64,
}

impl TradeSummary {
    pub fn summarize(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return TradeSummary {
                count: 0,
                win_rate_pct: 0.0,
                avg_return_pct: 0.0,
            };
        }

        let count = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let total_return: f64 = trades.iter().map(Trade::return_pct).sum();

        TradeSummary {
            count,
            win_rate_pct: wins as f64 / count as f64 * 100.0,
            avg_return_pct: total_return / count as f64,
        }
    }
}
