//! # candle-bts: deterministic candle backtesting
//!
//! **candle-bts** replays historical candles through a simulated exchange and
//! lets a trading strategy react to every closed candle. Same data, same
//! strategy, same seed: same trades, same balances, same annotations.
//!
//! ## Core Components
//! | Component | Description |
//! |-----------|-------------|
//! | **`Candle`** | OHLCV data over a time bucket; strict candles validate every mutation. |
//! | **`History`** | Candles over a `[start, end)` range: in memory, aggregated from trades, CSV or binary cache. |
//! | **`TestExchange`** | Pairs, balances and fees; executes market orders at the current candle close. |
//! | **`Strategy`** | Called once per closed candle with a `StrategyContext`. |
//! | **`SeriesCollector`** | Receives equity points and buy/sell/error labels for later charting. |
//! | **`CandleStrategyBacktester`** | The loop driving the exchange clock, the prices and the strategy. |
//!
//! ## Order Execution
//! - Market orders fill at the pair's current price, the close of the candle being replayed.
//! - A buy debits `amount * price` quoted and credits `amount - amount * fee` base.
//! - A sell debits `amount` base and credits `amount * price * (1 - fee)` quoted.
//! - A balance that would go negative rejects the order; strategies see `Ok(false)`.
//!
//! ## Run a Backtest
//! ```rust
//! use std::sync::Arc;
//!
//! use candle_bts::prelude::*;
//!
//! // two hours of synthetic trades, one-minute candles
//! let range = HistoryRange::new("BTCUSD", 0, 2 * 3_600_000, 60_000).unwrap();
//! let mut history = TradeCandleHistory::new(range, RandomTrades::new(7, 100.0));
//! history.load(&mut NoProgress).unwrap();
//!
//! let mut exchange = TestExchange::new()
//!     .with_pair("BTCUSD", Pair::new("BTC", "USD", Arc::new(Fees::flat(0.001))))
//!     .unwrap()
//!     .with_balance("BTC", Balance::new(0.0).unwrap())
//!     .unwrap()
//!     .with_balance("USD", Balance::new(10_000.0).unwrap())
//!     .unwrap();
//! let mut strategy = RandomStrategy::new(7, 0.25);
//! let mut recorder = Recorder::new();
//!
//! let mut backtester = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut recorder)
//!     .on_finish(|progress| Ok(progress.total() > 0));
//! assert!(backtester.backtest().unwrap());
//!
//! let report = backtester.report().unwrap();
//! println!("{report}");
//! ```
//!
//! ### Output:
//! ```bash
//! === Backtest Report ===
//! Symbol: BTCUSD
//! Strategy: random
//! State: finished
//! Candles: 120
//! Rejected Orders: 0
//! Base Balance: ...
//! Quoted Balance: ...
//! Equity: ...
//! ```
//!
//! ## Technical Indicators
//! Strategies keep their own state, so indicator crates such as
//! [`ta`](https://crates.io/crates/ta) plug in directly: feed each candle to
//! the indicator in `on_candle_close` and trade on its output.
//!
//! ## Error Handling
//! Every fallible operation returns [`errors::Result`]. Insufficient funds are
//! the only soft failure: the strategy helpers report them as `Ok(false)` and
//! the run goes on. Anything else (unknown symbol, invalid candle, cancelled
//! load, callback error) aborts the backtest.
//!
//! ## Features
//! | Feature | Purpose |
//! |---------|---------|
//! | `serde` *(default)* | Serialize candles, reports and annotations; JSON configuration. |
//! | `cli` | The `candle-bts` binary. |

/// Replay loop, progress callbacks and run report.
pub mod backtest;

/// Annotation series produced while backtesting.
pub mod collector;

/// Run configuration.
pub mod config;

/// Market value types: candles, trades, fees, balances and pairs.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Exchange contract and its deterministic simulation.
pub mod exchange;

/// Candle sources.
pub mod history;

/// Strategy and history lookup by name.
pub mod registry;

/// Strategy contract and built-in strategies.
pub mod strategy;

/// Utility functions and helpers.
pub mod utils;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::backtest::*;
    pub use crate::collector::*;
    pub use crate::config::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::exchange::*;
    pub use crate::history::*;
    pub use crate::registry::{HistoryKind, StrategyKind};
    pub use crate::strategy::*;
}
