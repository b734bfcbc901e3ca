//! Target-weight rebalancing.

use std::collections::BTreeMap;

use super::error::CopilotError;

/// Current market value held per ticker symbol.
pub type Holdings = BTreeMap<String, f64>;
/// Target fraction of portfolio value per ticker symbol.
pub type Allocations = BTreeMap<String, f64>;
/// Signed currency amount per ticker: positive buys, negative sells.
pub type Orders = BTreeMap<String, f64>;

const WEIGHT_SUM_REL_TOLERANCE: f64 = 1e-3;

fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

/// Orders that move each targeted ticker to `weight * portfolio_value`.
///
/// Tickers held but absent from `target_allocations` get no order; they are
/// left untouched rather than liquidated.
pub fn rebalance_portfolio(
    current_positions: &Holdings,
    target_allocations: &Allocations,
    portfolio_value: f64,
) -> Result<Orders, CopilotError> {
    if portfolio_value.is_nan() || portfolio_value <= 0.0 {
        return Err(CopilotError::invalid("portfolio_value must be positive"));
    }
    let weight_sum: f64 = target_allocations.values().sum();
    if !is_close(weight_sum, 1.0, WEIGHT_SUM_REL_TOLERANCE) {
        return Err(CopilotError::invalid(format!(
            "target allocations must sum to 1.0 (got {weight_sum})"
        )));
    }

    let orders = target_allocations
        .iter()
        .map(|(ticker, &weight)| {
            let current_value = current_positions.get(ticker).copied().unwrap_or(0.0);
            (ticker.clone(), weight * portfolio_value - current_value)
        })
        .collect();
    Ok(orders)
}
