//! Name-based construction of strategies and histories.
//!
//! The binary only knows the names found in its configuration; the kinds
//! below map those names to boxed trait objects.

use std::{fmt, str::FromStr};

use crate::{
    config::BacktestConfig,
    errors::{Error, Result},
    history::{CachedCandleHistory, CandleHistory, CsvCandleHistory, RandomTrades, TradeCandleHistory},
    strategy::{BuyAndHold, Idle, RandomStrategy, Strategy},
};

/// Built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    BuyAndHold,
    Random,
    Idle,
}

impl StrategyKind {
    pub const ALL: [Self; 3] = [Self::BuyAndHold, Self::Random, Self::Idle];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BuyAndHold => "buy-and-hold",
            Self::Random => "random",
            Self::Idle => "idle",
        }
    }

    /// Builds the strategy with the seed and fraction of `config`.
    pub fn build(&self, config: &BacktestConfig) -> Box<dyn Strategy> {
        match self {
            Self::BuyAndHold => Box::new(BuyAndHold::new(config.fraction)),
            Self::Random => Box::new(RandomStrategy::new(config.seed, config.fraction)),
            Self::Idle => Box::new(Idle),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownKind {
                kind: "strategy",
                name: name.to_owned(),
            })
    }
}

/// Built-in history sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    /// Seeded synthetic trades aggregated into candles.
    Random,
    /// CSV export read from `history_path`.
    Csv,
    /// Binary candle cache read from `history_path`.
    Cache,
}

impl HistoryKind {
    pub const ALL: [Self; 3] = [Self::Random, Self::Csv, Self::Cache];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Csv => "csv",
            Self::Cache => "cache",
        }
    }

    /// Builds an unloaded history over the range of `config`.
    pub fn build(&self, config: &BacktestConfig) -> Result<Box<dyn CandleHistory>> {
        let range = config.range()?;
        let history: Box<dyn CandleHistory> = match self {
            Self::Random => Box::new(TradeCandleHistory::new(
                range,
                RandomTrades::new(config.seed, config.start_price),
            )),
            Self::Csv => Box::new(CsvCandleHistory::new(range, self.path(config)?)),
            Self::Cache => Box::new(CachedCandleHistory::new(range, self.path(config)?)),
        };
        Ok(history)
    }

    fn path<'c>(&self, config: &'c BacktestConfig) -> Result<&'c std::path::Path> {
        config
            .history_path
            .as_deref()
            .ok_or_else(|| Error::missing("history path", self.name()))
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HistoryKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownKind {
                kind: "history",
                name: name.to_owned(),
            })
    }
}

/// Builds the strategy named in `config`.
pub fn strategy(config: &BacktestConfig) -> Result<Box<dyn Strategy>> {
    Ok(config.strategy.parse::<StrategyKind>()?.build(config))
}

/// Builds the history named in `config`, not loaded yet.
pub fn history(config: &BacktestConfig) -> Result<Box<dyn CandleHistory>> {
    config.history.parse::<HistoryKind>()?.build(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{History, NoProgress};

    #[test]
    fn names() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
        for kind in HistoryKind::ALL {
            assert_eq!(kind.to_string().parse::<HistoryKind>().unwrap(), kind);
        }

        let err = "martingale".parse::<StrategyKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown strategy: martingale");
        assert!(matches!("ftp".parse::<HistoryKind>(), Err(Error::UnknownKind { kind: "history", .. })));
    }

    #[test]
    fn build_strategy() {
        let config = BacktestConfig {
            strategy: "random".to_owned(),
            ..Default::default()
        };
        assert_eq!(strategy(&config).unwrap().name(), "random");
    }

    #[test]
    fn random_history_loads() {
        let config = BacktestConfig {
            end: 10 * 60_000,
            ..Default::default()
        };
        let mut history = history(&config).unwrap();
        assert!(history.candles().is_empty());

        history.load(&mut NoProgress).unwrap();
        assert_eq!(history.symbol(), "BTCUSD");
        assert!(!history.candles().is_empty());
        assert!(history.candles().len() <= 10);
    }

    #[test]
    fn file_history_needs_path() {
        let config = BacktestConfig {
            history: "csv".to_owned(),
            ..Default::default()
        };
        assert!(matches!(history(&config), Err(Error::Missing { kind: "history path", .. })));
    }
}
