//! Synthetic OHLCV generator.
//!
//! Produces a trending random walk: each candle draws, in order, a drift
//! `U(-0.01, 0.018)`, a shock `N(0, daily_volatility)`, the high/low wicks
//! `U(0, 0.02)`, the open offset `U(-0.01, 0.01)` and the volume `U(50, 250)`.
//! With a seed the series is reproducible; without one it is not.

use chrono::{Duration, NaiveDateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::domain::candle::Candle;
use crate::domain::error::CopilotError;

pub const DEFAULT_DAYS: i64 = 120;
pub const DEFAULT_BASE_PRICE: f64 = 1_000_000.0;
pub const DEFAULT_DAILY_VOLATILITY: f64 = 0.035;

const PRICE_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    pub days: i64,
    pub base_price: f64,
    pub daily_volatility: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        GeneratorParams {
            days: DEFAULT_DAYS,
            base_price: DEFAULT_BASE_PRICE,
            daily_volatility: DEFAULT_DAILY_VOLATILITY,
            seed: None,
        }
    }
}

impl GeneratorParams {
    pub fn seeded(days: i64, seed: u64) -> Self {
        GeneratorParams {
            days,
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Generate candles ending one day before the current UTC time.
pub fn generate_synthetic_prices(params: &GeneratorParams) -> Result<Vec<Candle>, CopilotError> {
    generate_synthetic_prices_at(params, Utc::now().naive_utc())
}

/// Generate `params.days` daily candles starting `params.days` days before `now`.
pub fn generate_synthetic_prices_at(
    params: &GeneratorParams,
    now: NaiveDateTime,
) -> Result<Vec<Candle>, CopilotError> {
    if params.days <= 0 {
        return Err(CopilotError::invalid("`days` must be positive"));
    }
    let start = TimeDelta::try_days(params.days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| CopilotError::invalid("days out of range"))?;
    if !params.base_price.is_finite() || params.base_price <= 0.0 {
        return Err(CopilotError::invalid("base_price must be positive"));
    }
    let shock_dist = Normal::new(0.0, params.daily_volatility)
        .ok()
        .filter(|_| params.daily_volatility.is_finite())
        .ok_or_else(|| CopilotError::invalid("daily_volatility must be finite and non-negative"))?;

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::debug!(
        days = params.days,
        base_price = params.base_price,
        daily_volatility = params.daily_volatility,
        seed = ?params.seed,
        "generating synthetic prices"
    );

    let mut timestamp = start;
    let mut price = params.base_price;
    let mut candles = Vec::with_capacity(params.days as usize);

    for _ in 0..params.days {
        let drift: f64 = rng.gen_range(-0.01..0.018);
        let shock = shock_dist.sample(&mut rng);
        price = (price * (1.0 + drift + shock)).max(PRICE_FLOOR);
        let high = price * (1.0 + rng.gen_range(0.0..0.02));
        let low = price * (1.0 - rng.gen_range(0.0..0.02));
        let open = price * (1.0 - rng.gen_range(-0.01..0.01));
        let volume = rng.gen_range(50.0..250.0);

        candles.push(Candle {
            timestamp,
            open,
            high,
            low,
            close: price,
            volume,
        });
        timestamp += Duration::days(1);
    }

    Ok(candles)
}
