//! Backtest configuration.
//!
//! Everything the `candle-bts` binary needs to set up a run: the traded pair,
//! the starting balances, the history to replay and the strategy to drive.
//! With the `serde` feature the configuration is read from JSON, every
//! missing field falling back to [`BacktestConfig::default`].

use std::{path::PathBuf, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::{Balance, Fees, Pair},
    errors::Result,
    exchange::TestExchange,
    history::HistoryRange,
};

/// One-minute candles.
pub const DEFAULT_PERIOD: i64 = 60_000;

/// Setup of a single backtest run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Pair symbol, e.g. `BTCUSD`.
    pub symbol: String,
    pub base: String,
    pub quoted: String,
    pub fees: Fees,
    pub base_balance: Balance,
    pub quoted_balance: Balance,
    /// First bucket start, in milliseconds.
    pub start: i64,
    /// Exclusive end of the range, in milliseconds.
    pub end: i64,
    /// Bucket width, in milliseconds.
    pub period: i64,
    /// Seeds both the synthetic tape and the random strategy.
    pub seed: u64,
    /// History source: `random`, `csv` or `cache`.
    pub history: String,
    /// File read by the `csv` and `cache` histories.
    pub history_path: Option<PathBuf>,
    /// First price of the `random` history.
    pub start_price: f64,
    /// Strategy name: `buy-and-hold`, `random` or `idle`.
    pub strategy: String,
    /// Share of the balance a strategy trades at once.
    pub fraction: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSD".to_owned(),
            base: "BTC".to_owned(),
            quoted: "USD".to_owned(),
            fees: Fees::flat(0.001),
            base_balance: Balance::default(),
            quoted_balance: Balance::new(10_000.0).unwrap_or_default(),
            start: 0,
            end: 24 * 60 * DEFAULT_PERIOD,
            period: DEFAULT_PERIOD,
            seed: 42,
            history: "random".to_owned(),
            history_path: None,
            start_price: 100.0,
            strategy: "buy-and-hold".to_owned(),
            fraction: 1.0,
        }
    }
}

impl BacktestConfig {
    /// Reads a JSON configuration file.
    #[cfg(feature = "serde")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        crate::utils::read_json(path.as_ref())
    }

    /// Range covered by the history of this run.
    pub fn range(&self) -> Result<HistoryRange> {
        HistoryRange::new(self.symbol.as_str(), self.start, self.end, self.period)
    }
}

/// Re-applies the creation rules a deserialized balance skipped.
fn checked(balance: Balance) -> Result<Balance> {
    if balance.can_go_negative() {
        Ok(balance)
    } else {
        Balance::new(balance.amount())
    }
}

impl TestExchange {
    /// Creates an exchange holding the configured pair and balances.
    ///
    /// ### Returns
    /// An error when a strict balance starts negative or when base and quoted
    /// are the same currency.
    pub fn from_config(config: &BacktestConfig) -> Result<Self> {
        let pair = Pair::new(config.base.as_str(), config.quoted.as_str(), Arc::new(config.fees));
        Self::new()
            .with_pair(config.symbol.as_str(), pair)?
            .with_balance(config.base.as_str(), checked(config.base_balance)?)?
            .with_balance(config.quoted.as_str(), checked(config.quoted_balance)?)
    }
}
