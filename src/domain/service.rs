//! Entry points used by the service layer: simulate, rebalance, synthetic prices.

use chrono::NaiveDateTime;

use super::backtest::run_ema_strategy;
use super::error::CopilotError;
use super::payload::{
    CandlePayload, RebalanceRequest, RebalanceResponse, SimulationRequest, SimulationResponse,
};
use super::portfolio::rebalance_portfolio;
use super::price_gen::{generate_synthetic_prices_at, GeneratorParams};

/// Run the crossover strategy on the request's prices, or on a default
/// synthetic series (seeded by `request.seed`) when none are supplied.
pub fn simulate(
    request: &SimulationRequest,
    now: NaiveDateTime,
) -> Result<SimulationResponse, CopilotError> {
    request.validate()?;

    let generated;
    let candles: &[CandlePayload] = match request.explicit_prices() {
        Some(prices) => prices,
        None => {
            let params = GeneratorParams {
                seed: request.seed,
                ..GeneratorParams::default()
            };
            generated = generate_synthetic_prices_at(&params, now)?;
            &generated
        }
    };

    let report = run_ema_strategy(candles, &request.backtest_config())?;
    tracing::info!(
        candles = candles.len(),
        trades = report.trades.len(),
        total_return_pct = report.total_return_pct,
        "simulation complete"
    );
    Ok(SimulationResponse::from(report))
}

pub fn rebalance(request: &RebalanceRequest) -> Result<RebalanceResponse, CopilotError> {
    let orders = rebalance_portfolio(
        &request.current_positions,
        &request.target_allocations,
        request.portfolio_value,
    )?;
    Ok(RebalanceResponse { orders })
}

pub fn synthetic_prices(
    days: i64,
    seed: Option<u64>,
    now: NaiveDateTime,
) -> Result<Vec<CandlePayload>, CopilotError> {
    let params = GeneratorParams {
        days,
        seed,
        ..GeneratorParams::default()
    };
    generate_synthetic_prices_at(&params, now)
}
