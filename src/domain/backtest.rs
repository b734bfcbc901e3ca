//! EMA crossover backtest.
//!
//! A single-asset, all-in-or-flat simulation. The position is modelled as a
//! two-state machine ([`SimState`]) folded over the candle sequence: a fast
//! EMA crossing above the slow EMA buys with all cash, crossing below sells
//! the whole position. Fees are a fraction of the traded notional on both
//! sides. Any open position is liquidated at the last close.

use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::error::CopilotError;
use super::indicator::{ema, Crossover};
use super::metrics::{annualized_return_pct, max_drawdown, span_days, total_return_pct};
use super::trade::Trade;

pub const DEFAULT_FAST_PERIOD: usize = 12;
pub const DEFAULT_SLOW_PERIOD: usize = 26;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 5_000_000.0;
pub const DEFAULT_FEE_RATE: f64 = 0.0005;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub initial_capital: f64,
    pub fee_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), CopilotError> {
        if self.fast_period >= self.slow_period {
            return Err(CopilotError::invalid(
                "fast_period must be smaller than slow_period",
            ));
        }
        if self.initial_capital.is_nan() || self.initial_capital <= 0.0 {
            return Err(CopilotError::invalid("initial_capital must be positive"));
        }
        Ok(())
    }
}

/// Position state between candles. Cash is zero while long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimState {
    Flat { cash: f64 },
    Long { quantity: f64, entry_price: f64 },
}

impl SimState {
    /// Cash plus the position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        match *self {
            SimState::Flat { cash } => cash,
            SimState::Long { quantity, .. } => quantity * price,
        }
    }

    /// Apply the crossover observed at `candle` (with `prev` the candle before it).
    pub fn transition(
        self,
        signal: Option<Crossover>,
        prev: &Candle,
        candle: &Candle,
        fee_rate: f64,
    ) -> (SimState, Option<Trade>) {
        let price = candle.close;
        match (self, signal) {
            (SimState::Flat { cash }, Some(Crossover::Up)) if cash > 0.0 => {
                let quantity = (cash / price) * (1.0 - fee_rate);
                tracing::debug!(time = %candle.timestamp, price, quantity, "enter long");
                (
                    SimState::Long {
                        quantity,
                        entry_price: price,
                    },
                    None,
                )
            }
            (
                SimState::Long {
                    quantity,
                    entry_price,
                },
                Some(Crossover::Down),
            ) if quantity > 0.0 => {
                let cash = sell_proceeds(quantity, price, fee_rate);
                tracing::debug!(time = %candle.timestamp, price, cash, "exit long");
                let trade = Trade {
                    entry_time: prev.timestamp,
                    exit_time: candle.timestamp,
                    entry_price,
                    exit_price: price,
                    quantity,
                };
                (SimState::Flat { cash }, Some(trade))
            }
            (state, _) => (state, None),
        }
    }
}

fn sell_proceeds(quantity: f64, price: f64, fee_rate: f64) -> f64 {
    let gross = quantity * price;
    let fee = gross * fee_rate;
    gross - fee
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub trades: Vec<Trade>,
    /// One point per candle plus the post-liquidation cash.
    pub equity_curve: Vec<f64>,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub max_drawdown_pct: f64,
}

struct Run {
    state: SimState,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
}

pub fn run_ema_strategy(
    candles: &[Candle],
    config: &BacktestConfig,
) -> Result<StrategyReport, CopilotError> {
    config.validate()?;
    let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
        return Err(CopilotError::invalid("candles must not be empty"));
    };

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = ema(&closes, config.fast_period)?;
    let slow = ema(&closes, config.slow_period)?;

    let start = Run {
        state: SimState::Flat {
            cash: config.initial_capital,
        },
        trades: Vec::new(),
        equity_curve: Vec::with_capacity(candles.len() + 1),
    };

    let mut run = candles
        .iter()
        .enumerate()
        .fold(start, |mut run, (i, candle)| {
            run.equity_curve.push(run.state.equity(candle.close));
            if i == 0 {
                return run;
            }
            let signal = Crossover::detect(fast[i - 1], slow[i - 1], fast[i], slow[i]);
            let (next, trade) = run
                .state
                .transition(signal, &candles[i - 1], candle, config.fee_rate);
            run.state = next;
            run.trades.extend(trade);
            run
        });

    let final_cash = match run.state {
        SimState::Flat { cash } => cash,
        SimState::Long {
            quantity,
            entry_price,
        } if quantity > 0.0 => {
            let cash = sell_proceeds(quantity, last.close, config.fee_rate);
            let entry_anchor = if candles.len() >= 2 {
                &candles[candles.len() - 2]
            } else {
                last
            };
            tracing::debug!(
                time = %last.timestamp,
                price = last.close,
                cash,
                "liquidate open position"
            );
            run.trades.push(Trade {
                entry_time: entry_anchor.timestamp,
                exit_time: last.timestamp,
                entry_price,
                exit_price: last.close,
                quantity,
            });
            cash
        }
        SimState::Long { .. } => 0.0,
    };
    run.equity_curve.push(final_cash);

    let total_return = total_return_pct(config.initial_capital, final_cash);
    let annualized =
        annualized_return_pct(total_return, span_days(first.timestamp, last.timestamp));
    let max_drawdown_pct = max_drawdown(&run.equity_curve);

    Ok(StrategyReport {
        trades: run.trades,
        equity_curve: run.equity_curve,
        total_return_pct: total_return,
        annualized_return_pct: annualized,
        max_drawdown_pct,
    })
}
