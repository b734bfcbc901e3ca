//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first price (no SMA warmup), then
//! EMA[i] = (P[i] - EMA[i-1]) * k + EMA[i-1]. Every point is valid.

use crate::domain::error::CopilotError;

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

pub fn ema(prices: &[f64], period: usize) -> Result<Vec<f64>, CopilotError> {
    if period == 0 {
        return Err(CopilotError::invalid("EMA period must be positive"));
    }
    let Some((&first, rest)) = prices.split_first() else {
        return Ok(Vec::new());
    };

    let k = smoothing_factor(period);
    let mut values = Vec::with_capacity(prices.len());
    let mut current = first;
    values.push(current);

    for &price in rest {
        current = (price - current) * k + current;
        values.push(current);
    }

    Ok(values)
}
