//! Process configuration loaded from the environment.

use crate::domain::{Decimal, Period};
use crate::fees::{FeeSchedule, RevenueSplitPolicy};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub hyperliquid_api_url: String,
    pub ingest_interval_secs: u64,
    pub payout_interval_secs: u64,
    pub max_concurrent_platforms: usize,
    pub min_payout: Decimal,
    pub payout_currency: String,
    pub payout_period: Period,
    pub trading_platform_split: Decimal,
    pub onramp_platform_split: Decimal,
    pub spot_fee_rate: Decimal,
    pub perp_taker_fee_rate: Decimal,
    pub perp_maker_fee_rate: Decimal,
    pub payout_executor_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", "8080", |s| s.parse::<u16>().ok())?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let hyperliquid_api_url = env_map
            .get("HYPERLIQUID_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("HYPERLIQUID_API_URL".to_string()))?;

        let ingest_interval_secs =
            parse_or(&env_map, "INGEST_INTERVAL_SECS", "600", |s| s.parse().ok())?;
        let payout_interval_secs =
            parse_or(&env_map, "PAYOUT_INTERVAL_SECS", "3600", |s| s.parse().ok())?;
        let max_concurrent_platforms =
            parse_or(&env_map, "MAX_CONCURRENT_PLATFORMS", "4", |s| {
                s.parse::<usize>().ok().filter(|n| *n >= 1)
            })?;

        let min_payout = parse_or(&env_map, "MIN_PAYOUT", "10", |s| {
            Decimal::from_str(s).ok().filter(|d| !d.is_negative())
        })?;

        let payout_currency = env_map
            .get("PAYOUT_CURRENCY")
            .cloned()
            .unwrap_or_else(|| "USDC".to_string());

        let payout_period = parse_or(&env_map, "PAYOUT_PERIOD", "monthly", |s| {
            Period::from_str(s).ok()
        })?;

        let trading_platform_split = parse_or(&env_map, "TRADING_PLATFORM_SPLIT", "0.70", |s| {
            Decimal::from_ratio_str(s).ok()
        })?;
        let onramp_platform_split = parse_or(&env_map, "ONRAMP_PLATFORM_SPLIT", "0.50", |s| {
            Decimal::from_ratio_str(s).ok()
        })?;

        let spot_fee_rate = parse_or(&env_map, "SPOT_FEE_RATE", "0.002", |s| {
            Decimal::from_ratio_str(s).ok()
        })?;
        let perp_taker_fee_rate = parse_or(&env_map, "PERP_TAKER_FEE_RATE", "0.001", |s| {
            Decimal::from_ratio_str(s).ok()
        })?;
        let perp_maker_fee_rate = parse_or(&env_map, "PERP_MAKER_FEE_RATE", "0.0005", |s| {
            Decimal::from_ratio_str(s).ok()
        })?;

        let payout_executor_url = env_map.get("PAYOUT_EXECUTOR_URL").cloned();

        Ok(Config {
            port,
            database_path,
            hyperliquid_api_url,
            ingest_interval_secs,
            payout_interval_secs,
            max_concurrent_platforms,
            min_payout,
            payout_currency,
            payout_period,
            trading_platform_split,
            onramp_platform_split,
            spot_fee_rate,
            perp_taker_fee_rate,
            perp_maker_fee_rate,
            payout_executor_url,
        })
    }

    /// The canonical fee-rate table.
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(
            self.spot_fee_rate,
            self.perp_taker_fee_rate,
            self.perp_maker_fee_rate,
        )
    }

    /// The revenue-split contract, one ratio per stream.
    pub fn split_policy(&self) -> RevenueSplitPolicy {
        RevenueSplitPolicy::new(self.trading_platform_split, self.onramp_platform_split)
    }
}

fn parse_or<T>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    let raw = env_map.get(key).map(|s| s.as_str()).unwrap_or(default);
    parse(raw).ok_or_else(|| {
        ConfigError::InvalidValue(key.to_string(), format!("could not parse {:?}", raw))
    })
}
