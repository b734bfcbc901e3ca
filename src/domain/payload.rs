//! Request and response shapes exchanged with the service layer.
//!
//! These mirror the JSON documents the HTTP front end marshals; the engine
//! itself never touches the wire.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::backtest::{
    BacktestConfig, StrategyReport, DEFAULT_FAST_PERIOD, DEFAULT_FEE_RATE,
    DEFAULT_INITIAL_CAPITAL, DEFAULT_SLOW_PERIOD,
};
use super::candle::{self, Candle};
use super::error::CopilotError;
use super::metrics::TradeSummary;
use super::portfolio::{Allocations, Holdings, Orders};
use super::trade::Trade;

pub type CandlePayload = Candle;

pub const FAST_PERIOD_RANGE: (usize, usize) = (2, 60);
pub const SLOW_PERIOD_RANGE: (usize, usize) = (3, 200);
pub const MAX_FEE_RATE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRequest {
    pub fast_period: usize,
    pub slow_period: usize,
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub seed: Option<u64>,
    pub prices: Option<Vec<CandlePayload>>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        SimulationRequest {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
            seed: None,
            prices: None,
        }
    }
}

fn check_range(name: &str, value: usize, (min, max): (usize, usize)) -> Result<(), CopilotError> {
    if value < min || value > max {
        return Err(CopilotError::invalid(format!(
            "{name} must be between {min} and {max} (got {value})"
        )));
    }
    Ok(())
}

impl SimulationRequest {
    pub fn validate(&self) -> Result<(), CopilotError> {
        check_range("fast_period", self.fast_period, FAST_PERIOD_RANGE)?;
        check_range("slow_period", self.slow_period, SLOW_PERIOD_RANGE)?;
        if self.slow_period <= self.fast_period {
            return Err(CopilotError::invalid(
                "slow_period must be greater than fast_period",
            ));
        }
        if self.initial_capital.is_nan() || self.initial_capital <= 0.0 {
            return Err(CopilotError::invalid("initial_capital must be positive"));
        }
        if !(0.0..=MAX_FEE_RATE).contains(&self.fee_rate) {
            return Err(CopilotError::invalid(format!(
                "fee_rate must be between 0 and {MAX_FEE_RATE}"
            )));
        }
        if let Some(prices) = &self.prices {
            if let Some(pos) = prices.iter().position(|c| !c.is_well_formed()) {
                return Err(CopilotError::invalid(format!(
                    "price at index {pos} has a non-positive open/close or negative field"
                )));
            }
            if !candle::is_ordered(prices) {
                return Err(CopilotError::invalid(
                    "prices must be in ascending timestamp order",
                ));
            }
        }
        Ok(())
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            fast_period: self.fast_period,
            slow_period: self.slow_period,
            initial_capital: self.initial_capital,
            fee_rate: self.fee_rate,
        }
    }

    /// Explicit prices, unless absent or empty.
    pub fn explicit_prices(&self) -> Option<&[CandlePayload]> {
        self.prices.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePayload {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub return_pct: f64,
}

impl From<&Trade> for TradePayload {
    fn from(trade: &Trade) -> Self {
        TradePayload {
            entry_time: trade.entry_time,
            exit_time: trade.exit_time,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            quantity: trade.quantity,
            pnl: trade.pnl(),
            return_pct: trade.return_pct(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub trades: Vec<TradePayload>,
    pub equity_curve: Vec<f64>,
    pub trade_summary: TradeSummary,
}

impl From<StrategyReport> for SimulationResponse {
    fn from(report: StrategyReport) -> Self {
        let trade_summary = TradeSummary::summarize(&report.trades);
        SimulationResponse {
            total_return_pct: report.total_return_pct,
            annualized_return_pct: report.annualized_return_pct,
            max_drawdown_pct: report.max_drawdown_pct,
            trades: report.trades.iter().map(TradePayload::from).collect(),
            equity_curve: report.equity_curve,
            trade_summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    pub current_positions: Holdings,
    pub target_allocations: Allocations,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceResponse {
    pub orders: Orders,
}
