//! CLI definition and dispatch.

use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::config_validation::{
    parse_optional, validate_rebalance_config, validate_simulation_config, CURRENT, REBALANCE,
    SIMULATION, TARGET,
};
use crate::domain::error::CopilotError;
use crate::domain::payload::{RebalanceRequest, SimulationRequest, SimulationResponse};
use crate::domain::portfolio::Holdings;
use crate::domain::price_gen::{self, GeneratorParams};
use crate::domain::service;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "iljin", about = "EMA crossover backtester and portfolio rebalancer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the EMA crossover strategy
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Candle CSV to use instead of synthetic prices
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        fast: Option<usize>,
        #[arg(long)]
        slow: Option<usize>,
        #[arg(long)]
        days: Option<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Compute orders that move holdings to target weights
    Rebalance {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Write a synthetic candle CSV
    Prices {
        #[arg(long, default_value_t = price_gen::DEFAULT_DAYS)]
        days: i64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line overrides applied on top of the `[simulation]` section.
#[derive(Debug, Clone, Default)]
pub struct SimulationOverrides {
    pub prices: Option<PathBuf>,
    pub seed: Option<u64>,
    pub fast: Option<usize>,
    pub slow: Option<usize>,
    pub days: Option<i64>,
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Simulate {
            config,
            prices,
            seed,
            fast,
            slow,
            days,
            output,
            pretty,
        } => {
            let overrides = SimulationOverrides {
                prices,
                seed,
                fast,
                slow,
                days,
            };
            run_simulate(config.as_deref(), &overrides, output.as_deref(), pretty)
        }
        Command::Rebalance {
            config,
            output,
            pretty,
        } => run_rebalance(&config, output.as_deref(), pretty),
        Command::Prices { days, seed, output } => run_prices(days, seed, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, CopilotError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| CopilotError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn build_simulation_request(
    config: &dyn ConfigPort,
) -> Result<SimulationRequest, CopilotError> {
    let defaults = SimulationRequest::default();
    Ok(SimulationRequest {
        fast_period: parse_optional(config, SIMULATION, "fast_period")?
            .unwrap_or(defaults.fast_period),
        slow_period: parse_optional(config, SIMULATION, "slow_period")?
            .unwrap_or(defaults.slow_period),
        initial_capital: parse_optional(config, SIMULATION, "initial_capital")?
            .unwrap_or(defaults.initial_capital),
        fee_rate: parse_optional(config, SIMULATION, "fee_rate")?.unwrap_or(defaults.fee_rate),
        seed: parse_optional(config, SIMULATION, "seed")?,
        prices: None,
    })
}

pub fn build_generator_params(config: &dyn ConfigPort) -> Result<GeneratorParams, CopilotError> {
    let defaults = GeneratorParams::default();
    Ok(GeneratorParams {
        days: parse_optional(config, SIMULATION, "days")?.unwrap_or(defaults.days),
        base_price: parse_optional(config, SIMULATION, "base_price")?
            .unwrap_or(defaults.base_price),
        daily_volatility: parse_optional(config, SIMULATION, "daily_volatility")?
            .unwrap_or(defaults.daily_volatility),
        seed: parse_optional(config, SIMULATION, "seed")?,
    })
}

fn read_amounts(config: &dyn ConfigPort, section: &str) -> Result<Holdings, CopilotError> {
    config
        .section_keys(section)
        .into_iter()
        .map(|ticker| {
            let amount = parse_optional::<f64>(config, section, &ticker)?.unwrap_or(0.0);
            Ok((ticker, amount))
        })
        .collect()
}

pub fn build_rebalance_request(config: &dyn ConfigPort) -> Result<RebalanceRequest, CopilotError> {
    let portfolio_value = parse_optional(config, REBALANCE, "portfolio_value")?.ok_or_else(|| {
        CopilotError::ConfigMissing {
            section: REBALANCE.into(),
            key: "portfolio_value".into(),
        }
    })?;
    Ok(RebalanceRequest {
        current_positions: read_amounts(config, CURRENT)?,
        target_allocations: read_amounts(config, TARGET)?,
        portfolio_value,
    })
}

fn apply_overrides(
    mut request: SimulationRequest,
    mut params: GeneratorParams,
    overrides: &SimulationOverrides,
) -> (SimulationRequest, GeneratorParams) {
    if let Some(seed) = overrides.seed {
        request.seed = Some(seed);
        params.seed = Some(seed);
    }
    if let Some(fast) = overrides.fast {
        request.fast_period = fast;
    }
    if let Some(slow) = overrides.slow {
        request.slow_period = slow;
    }
    if let Some(days) = overrides.days {
        params.days = days;
    }
    (request, params)
}

/// Resolve candles (from `data` when given, otherwise synthetic) and simulate.
pub fn run_simulation_pipeline(
    mut request: SimulationRequest,
    params: &GeneratorParams,
    data: Option<(&dyn DataPort, &str)>,
    now: NaiveDateTime,
) -> Result<SimulationResponse, CopilotError> {
    let candles = match data {
        Some((port, symbol)) => {
            tracing::info!(symbol, "loading candles");
            port.fetch_candles(symbol)?
        }
        None => {
            tracing::info!(
                days = params.days,
                seed = ?params.seed,
                "generating synthetic candles"
            );
            price_gen::generate_synthetic_prices_at(params, now)?
        }
    };
    if candles.is_empty() {
        return Err(CopilotError::Data {
            reason: "no candles to simulate".into(),
        });
    }

    tracing::info!(
        candles = candles.len(),
        fast = request.fast_period,
        slow = request.slow_period,
        "running EMA crossover backtest"
    );
    request.prices = Some(candles);
    service::simulate(&request, now)
}

pub fn print_summary(response: &SimulationResponse) {
    let summary = &response.trade_summary;
    eprintln!("\n=== Simulation Results ===");
    eprintln!("Total Return:     {:.2}%", response.total_return_pct);
    eprintln!("Annualized:       {:.2}%", response.annualized_return_pct);
    eprintln!("Max Drawdown:     -{:.1}%", response.max_drawdown_pct);
    eprintln!("Total Trades:     {}", summary.count);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate_pct);
    eprintln!("Avg Trade Return: {:.2}%", summary.avg_return_pct);
}

fn run_simulate(
    config_path: Option<&Path>,
    overrides: &SimulationOverrides,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), CopilotError> {
    let adapter = config_path.map(load_config).transpose()?;

    let (request, params, pretty, prices_path) = match &adapter {
        Some(config) => {
            validate_simulation_config(config)?;
            let prices_path = config.get_string(SIMULATION, "prices").map(PathBuf::from);
            (
                build_simulation_request(config)?,
                build_generator_params(config)?,
                pretty || config.get_bool("output", "pretty", false),
                prices_path,
            )
        }
        None => (
            SimulationRequest::default(),
            GeneratorParams::default(),
            pretty,
            None,
        ),
    };
    let (request, params) = apply_overrides(request, params, overrides);
    let prices_path = overrides.prices.clone().or(prices_path);

    let response = match prices_path {
        Some(path) => {
            let (csv_source, symbol) = CsvAdapter::for_file(&path)?;
            let port: &dyn DataPort = &csv_source;
            run_simulation_pipeline(request, &params, Some((port, symbol.as_str())), now())?
        }
        None => run_simulation_pipeline(request, &params, None, now())?,
    };

    print_summary(&response);
    JsonReportAdapter::new(pretty).write_simulation(&response, output)
}

fn run_rebalance(
    config_path: &Path,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), CopilotError> {
    let config = load_config(config_path)?;
    validate_rebalance_config(&config)?;
    let request = build_rebalance_request(&config)?;

    tracing::info!(
        tickers = request.target_allocations.len(),
        portfolio_value = request.portfolio_value,
        "computing rebalance orders"
    );
    let response = service::rebalance(&request)?;

    let pretty = pretty || config.get_bool("output", "pretty", false);
    JsonReportAdapter::new(pretty).write_rebalance(&response, output)
}

fn run_prices(days: i64, seed: Option<u64>, output: Option<&Path>) -> Result<(), CopilotError> {
    let candles = service::synthetic_prices(days, seed, now())?;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            csv_adapter::write_candles(file, &candles)?;
            tracing::info!(path = %path.display(), candles = candles.len(), "prices written");
        }
        None => csv_adapter::write_candles(std::io::stdout().lock(), &candles)?,
    }
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), CopilotError> {
    let config = load_config(config_path)?;
    validate_simulation_config(&config)?;
    let has_rebalance = !config.section_keys(TARGET).is_empty()
        || config.get_string(REBALANCE, "portfolio_value").is_some();
    if has_rebalance {
        validate_rebalance_config(&config)?;
        let request = build_rebalance_request(&config)?;
        service::rebalance(&request)?;
    }
    tracing::info!("config validated successfully");
    Ok(())
}
