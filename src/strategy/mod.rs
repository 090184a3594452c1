//! Strategy contract.
//!
//! A [`Strategy`] is called once per closed candle, oldest first. It reads the
//! market through [`StrategyContext::exchange`] and trades only through the
//! context's `market_buy`/`market_sell` helpers, which turn an insufficient
//! balance into `Ok(false)` (logged and annotated) instead of aborting the run.

mod builtin;

pub use builtin::*;

use tracing::warn;

use crate::{
    collector::{LabelColor, Series, SeriesCollector},
    engine::{Candle, OrderSide},
    errors::{Error, Result},
    exchange::Exchange,
    utils::format_ms,
};

/// Per-candle decision callback.
pub trait Strategy {
    /// Name used in logs and reports.
    fn name(&self) -> &str {
        "strategy"
    }

    /// Called when `candle` of `symbol` closes.
    fn on_candle_close(&mut self, _ctx: &mut StrategyContext<'_>, _symbol: &str, _candle: &Candle) -> Result<()> {
        Err(Error::Unimplemented("Strategy::on_candle_close"))
    }
}

/// What a strategy can touch while handling a candle.
pub struct StrategyContext<'a> {
    exchange: &'a mut dyn Exchange,
    collector: &'a mut dyn SeriesCollector,
    rejected: usize,
}

impl<'a> StrategyContext<'a> {
    pub fn new(exchange: &'a mut dyn Exchange, collector: &'a mut dyn SeriesCollector) -> Self {
        Self {
            exchange,
            collector,
            rejected: 0,
        }
    }

    /// Read-only view of the exchange.
    pub fn exchange(&self) -> &dyn Exchange {
        &*self.exchange
    }

    /// The annotation sink, for strategy-specific series.
    pub fn collector(&mut self) -> &mut dyn SeriesCollector {
        &mut *self.collector
    }

    /// Number of orders rejected through this context.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Buys `amount` of the base currency of `symbol` at market.
    ///
    /// ### Returns
    /// `Ok(true)` when filled, `Ok(false)` when rejected for lack of funds,
    /// or the error for anything else (unknown symbol, invalid amount or price).
    pub fn market_buy(&mut self, symbol: &str, amount: f64) -> Result<bool> {
        self.market(OrderSide::Buy, symbol, amount)
    }

    /// Sells `amount` of the base currency of `symbol` at market.
    ///
    /// Same return convention as [`StrategyContext::market_buy`].
    pub fn market_sell(&mut self, symbol: &str, amount: f64) -> Result<bool> {
        self.market(OrderSide::Sell, symbol, amount)
    }

    /// Samples the mark-to-market equity of `symbol` in its quoted currency.
    pub fn record_equity(&mut self, symbol: &str) -> Result<f64> {
        let time = self.exchange.current_time();
        let equity = self.exchange.balance_quoted_full(symbol)?;
        self.collector.append_point(Series::Equity, time, equity);
        Ok(equity)
    }

    fn market(&mut self, side: OrderSide, symbol: &str, amount: f64) -> Result<bool> {
        // annotate with the state the order was placed against
        let time = self.exchange.current_time();
        let price = self.exchange.current_price(symbol)?;

        let result = match side {
            OrderSide::Buy => self.exchange.market_buy(symbol, amount),
            OrderSide::Sell => self.exchange.market_sell(symbol, amount),
        };

        match result {
            Ok(()) => {
                let (series, color) = match side {
                    OrderSide::Buy => (Series::Buy, LabelColor::Green),
                    OrderSide::Sell => (Series::Sell, LabelColor::Red),
                };
                self.collector
                    .append_label(series, time, price, &format!("{side} {amount}"), color);
                Ok(true)
            }
            Err(err) if err.is_rejection() => {
                warn!(time = %format_ms(time), symbol, amount, %side, %err, "market order rejected");
                self.collector.append_label(
                    Series::Error,
                    time,
                    price,
                    &format!("{side} {amount} failed"),
                    LabelColor::Yellow,
                );
                self.rejected += 1;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
