//! Core domain types and logic: price generation, indicators, the crossover
//! simulator, analytics and rebalancing.

pub mod candle;
pub mod price_gen;
pub mod indicator;
pub mod trade;
pub mod backtest;
pub mod metrics;
pub mod portfolio;
pub mod payload;
pub mod service;
pub mod config_validation;
pub mod error;
