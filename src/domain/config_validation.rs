//! Configuration validation.
//!
//! Checks every INI value the engine reads before anything runs. Missing
//! optional keys are fine (defaults apply); present keys must parse and be
//! in range.

use std::str::FromStr;

use crate::domain::error::CopilotError;
use crate::domain::payload::{FAST_PERIOD_RANGE, MAX_FEE_RATE, SLOW_PERIOD_RANGE};
use crate::ports::config_port::ConfigPort;

pub const SIMULATION: &str = "simulation";
pub const REBALANCE: &str = "rebalance";
pub const CURRENT: &str = "current";
pub const TARGET: &str = "target";

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> CopilotError {
    CopilotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse `[section] key` if present. `Ok(None)` when absent.
pub fn parse_optional<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, CopilotError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse {raw:?}"))),
    }
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), CopilotError> {
    let fast = validate_period(config, "fast_period", FAST_PERIOD_RANGE)?;
    let slow = validate_period(config, "slow_period", SLOW_PERIOD_RANGE)?;
    if let (Some(fast), Some(slow)) = (fast, slow) {
        if slow <= fast {
            return Err(invalid(
                SIMULATION,
                "slow_period",
                "slow_period must be greater than fast_period",
            ));
        }
    }
    validate_positive(config, SIMULATION, "initial_capital")?;
    validate_fee_rate(config)?;
    validate_positive(config, SIMULATION, "base_price")?;
    validate_volatility(config)?;
    if let Some(days) = parse_optional::<i64>(config, SIMULATION, "days")? {
        if days <= 0 {
            return Err(invalid(SIMULATION, "days", "days must be positive"));
        }
    }
    parse_optional::<u64>(config, SIMULATION, "seed")?;
    Ok(())
}

pub fn validate_rebalance_config(config: &dyn ConfigPort) -> Result<(), CopilotError> {
    if config.get_string(REBALANCE, "portfolio_value").is_none() {
        return Err(CopilotError::ConfigMissing {
            section: REBALANCE.to_string(),
            key: "portfolio_value".to_string(),
        });
    }
    validate_positive(config, REBALANCE, "portfolio_value")?;

    let targets = config.section_keys(TARGET);
    if targets.is_empty() {
        return Err(CopilotError::ConfigMissing {
            section: TARGET.to_string(),
            key: "<ticker>".to_string(),
        });
    }
    validate_amounts(config, TARGET, &targets)?;
    validate_amounts(config, CURRENT, &config.section_keys(CURRENT))?;
    Ok(())
}

fn validate_period(
    config: &dyn ConfigPort,
    key: &str,
    (min, max): (usize, usize),
) -> Result<Option<usize>, CopilotError> {
    let value = parse_optional::<usize>(config, SIMULATION, key)?;
    if let Some(v) = value {
        if v < min || v > max {
            return Err(invalid(
                SIMULATION,
                key,
                format!("{key} must be between {min} and {max}"),
            ));
        }
    }
    Ok(value)
}

fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), CopilotError> {
    if let Some(v) = parse_optional::<f64>(config, section, key)? {
        if !v.is_finite() || v <= 0.0 {
            return Err(invalid(section, key, format!("{key} must be positive")));
        }
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), CopilotError> {
    if let Some(v) = parse_optional::<f64>(config, SIMULATION, "fee_rate")? {
        if !(0.0..=MAX_FEE_RATE).contains(&v) {
            return Err(invalid(
                SIMULATION,
                "fee_rate",
                format!("fee_rate must be between 0 and {MAX_FEE_RATE}"),
            ));
        }
    }
    Ok(())
}

fn validate_volatility(config: &dyn ConfigPort) -> Result<(), CopilotError> {
    if let Some(v) = parse_optional::<f64>(config, SIMULATION, "daily_volatility")? {
        if !v.is_finite() || v < 0.0 {
            return Err(invalid(
                SIMULATION,
                "daily_volatility",
                "daily_volatility must be non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_amounts(
    config: &dyn ConfigPort,
    section: &str,
    tickers: &[String],
) -> Result<(), CopilotError> {
    for ticker in tickers {
        match parse_optional::<f64>(config, section, ticker)? {
            Some(v) if v.is_finite() => {}
            _ => return Err(invalid(section, ticker, "amount must be a finite number")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        data: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                data: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.data
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.data
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .map(|v| v == "true")
                .unwrap_or(default)
        }

        fn section_keys(&self, section: &str) -> Vec<String> {
            let mut keys: Vec<String> = self
                .data
                .keys()
                .filter(|(s, _)| s == section)
                .map(|(_, k)| k.clone())
                .collect();
            keys.sort();
            keys
        }
    }

    fn valid_rebalance() -> MockConfig {
        MockConfig::new()
            .set("rebalance", "portfolio_value", "4000000")
            .set("current", "SPY", "2000000")
            .set("target", "SPY", "0.6")
            .set("target", "ETH", "0.4")
    }

    fn assert_invalid_key(result: Result<(), CopilotError>, expected: &str) {
        match result {
            Err(CopilotError::ConfigInvalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {expected}, got {other:?}"),
        }
    }

    #[test]
    fn empty_simulation_config_is_valid() {
        assert!(validate_simulation_config(&MockConfig::new()).is_ok());
    }

    #[test]
    fn full_simulation_config_is_valid() {
        let config = MockConfig::new()
            .set("simulation", "fast_period", "8")
            .set("simulation", "slow_period", "21")
            .set("simulation", "initial_capital", "5000000")
            .set("simulation", "fee_rate", "0.0005")
            .set("simulation", "days", "60")
            .set("simulation", "seed", "7")
            .set("simulation", "base_price", "100")
            .set("simulation", "daily_volatility", "0.02");
        assert!(validate_simulation_config(&config).is_ok());
    }

    #[test]
    fn period_out_of_range() {
        let config = MockConfig::new().set("simulation", "fast_period", "1");
        assert_invalid_key(validate_simulation_config(&config), "fast_period");

        let config = MockConfig::new().set("simulation", "slow_period", "500");
        assert_invalid_key(validate_simulation_config(&config), "slow_period");
    }

    #[test]
    fn slow_not_greater_than_fast() {
        let config = MockConfig::new()
            .set("simulation", "fast_period", "30")
            .set("simulation", "slow_period", "10");
        assert_invalid_key(validate_simulation_config(&config), "slow_period");
    }

    #[test]
    fn unparseable_period() {
        let config = MockConfig::new().set("simulation", "fast_period", "eight");
        assert_invalid_key(validate_simulation_config(&config), "fast_period");
    }

    #[test]
    fn non_positive_capital() {
        let config = MockConfig::new().set("simulation", "initial_capital", "0");
        assert_invalid_key(validate_simulation_config(&config), "initial_capital");
    }

    #[test]
    fn fee_rate_out_of_range() {
        let config = MockConfig::new().set("simulation", "fee_rate", "0.05");
        assert_invalid_key(validate_simulation_config(&config), "fee_rate");
    }

    #[test]
    fn negative_seed() {
        let config = MockConfig::new().set("simulation", "seed", "-3");
        assert_invalid_key(validate_simulation_config(&config), "seed");
    }

    #[test]
    fn zero_days() {
        let config = MockConfig::new().set("simulation", "days", "0");
        assert_invalid_key(validate_simulation_config(&config), "days");
    }

    #[test]
    fn negative_volatility() {
        let config = MockConfig::new().set("simulation", "daily_volatility", "-0.1");
        assert_invalid_key(validate_simulation_config(&config), "daily_volatility");
    }

    #[test]
    fn valid_rebalance_config() {
        assert!(validate_rebalance_config(&valid_rebalance()).is_ok());
    }

    #[test]
    fn rebalance_requires_portfolio_value() {
        let config = MockConfig::new().set("target", "SPY", "1.0");
        let err = validate_rebalance_config(&config).unwrap_err();
        assert!(matches!(err, CopilotError::ConfigMissing { key, .. } if key == "portfolio_value"));
    }

    #[test]
    fn rebalance_requires_targets() {
        let config = MockConfig::new().set("rebalance", "portfolio_value", "100");
        let err = validate_rebalance_config(&config).unwrap_err();
        assert!(matches!(err, CopilotError::ConfigMissing { section, .. } if section == "target"));
    }

    #[test]
    fn rebalance_rejects_bad_amount() {
        let config = valid_rebalance().set("current", "BTC", "lots");
        assert_invalid_key(validate_rebalance_config(&config), "BTC");
    }

    #[test]
    fn rebalance_rejects_negative_portfolio_value() {
        let config = valid_rebalance().set("rebalance", "portfolio_value", "-1");
        assert_invalid_key(validate_rebalance_config(&config), "portfolio_value");
    }
}
