//! Candle replay loop.
//!
//! [`CandleStrategyBacktester`] walks a [`CandleHistory`] oldest first. For each
//! candle it moves the [`TestExchange`] clock to the candle's end, sets the
//! traded pair's price to the close, lets the step callback observe (or
//! cancel) and finally hands the candle to the [`Strategy`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::{
    collector::SeriesCollector,
    engine::Candle,
    errors::{Error, Result},
    exchange::{Exchange, TestExchange},
    history::{CandleHistory, History},
    strategy::{Strategy, StrategyContext},
};

#[cfg(test)]
mod tests;

/// Lifecycle of a backtest.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestState {
    NotStarted,
    Running,
    /// Every candle went through the strategy.
    Finished,
    /// A progress callback asked to stop.
    Cancelled,
    /// A callback, the strategy or the exchange returned an error.
    Failed,
}

impl fmt::Display for BacktestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(state)
    }
}

/// What the progress callbacks see.
///
/// `candle` is `None` in the start callback.
#[derive(Debug, Clone, Copy)]
pub struct ProgressContext<'c> {
    symbol: &'c str,
    index: usize,
    total: usize,
    candle: Option<&'c Candle>,
    current_time: i64,
}

impl<'c> ProgressContext<'c> {
    pub fn symbol(&self) -> &'c str {
        self.symbol
    }

    /// Position of the current candle in the history.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of candles in the history.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn candle(&self) -> Option<&'c Candle> {
        self.candle
    }

    /// Exchange time in milliseconds.
    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    /// Share of the history already handed to the strategy.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.index * 100 / self.total).min(100) as u8
    }
}

/// Progress callback: `Ok(false)` cancels the backtest.
pub type ProgressCallback<'a> = Box<dyn FnMut(&ProgressContext<'_>) -> Result<bool> + 'a>;

/// Summary of a backtest run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub symbol: String,
    pub strategy: String,
    pub state: BacktestState,
    /// Candles handed to the strategy.
    pub candles: usize,
    /// Orders rejected for lack of funds.
    pub rejected: usize,
    pub base: f64,
    pub quoted: f64,
    /// Quoted balance plus base balance at the last price.
    pub equity: f64,
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtest Report ===")?;
        writeln!(f, "Symbol: {}", self.symbol)?;
        writeln!(f, "Strategy: {}", self.strategy)?;
        writeln!(f, "State: {}", self.state)?;
        writeln!(f, "Candles: {}", self.candles)?;
        writeln!(f, "Rejected Orders: {}", self.rejected)?;
        writeln!(f, "Base Balance: {:.8}", self.base)?;
        writeln!(f, "Quoted Balance: {:.2}", self.quoted)?;
        write!(f, "Equity: {:.2}", self.equity)
    }
}

/// Drives a strategy over a candle history against a simulated exchange.
///
/// The backtester borrows everything it works on; inspect the exchange, the
/// strategy and the collector once it is dropped, or call
/// [`CandleStrategyBacktester::report`].
///
/// ### Example
/// ```rust
/// use std::sync::Arc;
///
/// use candle_bts::prelude::*;
///
/// let range = HistoryRange::new("BTCUSD", 0, 180, 60).unwrap();
/// let candles = vec![
///     Candle::new(100.0, 101.0, 99.0, 102.0, 1.0, 0, 59).unwrap(),
///     Candle::new(101.0, 103.0, 100.0, 104.0, 1.0, 60, 119).unwrap(),
/// ];
/// let history = VecCandleHistory::new(range, candles);
/// let mut exchange = TestExchange::new()
///     .with_pair("BTCUSD", Pair::new("BTC", "USD", Arc::new(Fees::flat(0.001))))
///     .unwrap()
///     .with_balance("BTC", Balance::new(0.0).unwrap())
///     .unwrap()
///     .with_balance("USD", Balance::new(1_000.0).unwrap())
///     .unwrap();
/// let mut strategy = BuyAndHold::new(0.5);
/// let mut recorder = Recorder::new();
///
/// let mut bt = CandleStrategyBacktester::new(&history, &mut exchange, &mut strategy, &mut recorder)
///     .on_step(|progress| Ok(progress.index() < 10));
/// assert!(bt.backtest().unwrap());
/// assert_eq!(bt.state(), BacktestState::Finished);
/// ```
pub struct CandleStrategyBacktester<'a> {
    history: &'a dyn CandleHistory,
    exchange: &'a mut TestExchange,
    strategy: &'a mut dyn Strategy,
    collector: &'a mut dyn SeriesCollector,
    on_start: Option<ProgressCallback<'a>>,
    on_step: Option<ProgressCallback<'a>>,
    on_finish: Option<ProgressCallback<'a>>,
    state: BacktestState,
    processed: usize,
    rejected: usize,
}

impl<'a> CandleStrategyBacktester<'a> {
    /// Creates a backtester over the loaded `history`.
    ///
    /// ### Arguments
    /// * `history` - Candles to replay; its symbol must be a pair of `exchange`.
    /// * `exchange` - Simulated exchange whose clock and prices the loop drives.
    /// * `strategy` - Called once per candle.
    /// * `collector` - Receives the strategy's annotations.
    pub fn new(
        history: &'a dyn CandleHistory,
        exchange: &'a mut TestExchange,
        strategy: &'a mut dyn Strategy,
        collector: &'a mut dyn SeriesCollector,
    ) -> Self {
        Self {
            history,
            exchange,
            strategy,
            collector,
            on_start: None,
            on_step: None,
            on_finish: None,
            state: BacktestState::NotStarted,
            processed: 0,
            rejected: 0,
        }
    }

    /// Called once before the first candle; `Ok(false)` cancels.
    pub fn on_start<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressContext<'_>) -> Result<bool> + 'a,
    {
        self.on_start = Some(Box::new(callback));
        self
    }

    /// Called for each candle before the strategy sees it; `Ok(false)` cancels.
    pub fn on_step<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressContext<'_>) -> Result<bool> + 'a,
    {
        self.on_step = Some(Box::new(callback));
        self
    }

    /// Called after the last candle; its value becomes the backtest result.
    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressContext<'_>) -> Result<bool> + 'a,
    {
        self.on_finish = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> BacktestState {
        self.state
    }

    /// Candles handed to the strategy so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Runs the backtest to completion or cancellation.
    ///
    /// ### Returns
    /// `Ok(true)` once every candle went through the strategy (or whatever the
    /// finish callback returned), `Ok(false)` on cancellation, or the first
    /// error raised by a callback, the strategy or the exchange.
    pub fn backtest(&mut self) -> Result<bool> {
        if self.state != BacktestState::NotStarted {
            return Err(Error::AlreadyRan(self.state.to_string()));
        }

        self.state = BacktestState::Running;
        let result = self.run();
        self.state = match result {
            Ok(_) if self.state == BacktestState::Cancelled => BacktestState::Cancelled,
            Ok(_) => BacktestState::Finished,
            Err(_) => BacktestState::Failed,
        };
        result
    }

    fn run(&mut self) -> Result<bool> {
        let history = self.history;
        let symbol = history.symbol();
        let candles = history.candles();
        info!(
            symbol,
            candles = candles.len(),
            strategy = self.strategy.name(),
            "backtest started"
        );

        let mut progress = ProgressContext {
            symbol,
            index: 0,
            total: candles.len(),
            candle: None,
            current_time: self.exchange.current_time(),
        };

        if let Some(on_start) = self.on_start.as_mut() {
            if !on_start(&progress)? {
                return Ok(self.cancel(&progress));
            }
        }

        for (index, candle) in candles.iter().enumerate() {
            self.exchange.set_current_time(candle.end());
            self.exchange.set_price(symbol, candle.close())?;
            progress.index = index;
            progress.candle = Some(candle);
            progress.current_time = candle.end();
            trace!(index, time = candle.end(), close = candle.close(), "step");

            if let Some(on_step) = self.on_step.as_mut() {
                if !on_step(&progress)? {
                    return Ok(self.cancel(&progress));
                }
            }

            let mut ctx = StrategyContext::new(&mut *self.exchange, &mut *self.collector);
            self.strategy.on_candle_close(&mut ctx, symbol, candle)?;
            self.rejected += ctx.rejected();
            self.processed += 1;
        }

        progress.index = candles.len();
        let result = match self.on_finish.as_mut() {
            Some(on_finish) => on_finish(&progress)?,
            None => true,
        };
        info!(symbol, candles = self.processed, rejected = self.rejected, result, "backtest finished");
        Ok(result)
    }

    fn cancel(&mut self, progress: &ProgressContext<'_>) -> bool {
        info!(
            symbol = progress.symbol,
            index = progress.index,
            candles = self.processed,
            "backtest cancelled"
        );
        self.state = BacktestState::Cancelled;
        false
    }

    /// Summarizes the run from the exchange's current balances.
    pub fn report(&self) -> Result<BacktestReport> {
        let symbol = self.history.symbol();
        Ok(BacktestReport {
            symbol: symbol.to_owned(),
            strategy: self.strategy.name().to_owned(),
            state: self.state,
            candles: self.processed,
            rejected: self.rejected,
            base: self.exchange.balance_base(symbol)?,
            quoted: self.exchange.balance_quoted(symbol)?,
            equity: self.exchange.balance_quoted_full(symbol)?,
        })
    }
}
