//! Exchange abstraction.
//!
//! An [`Exchange`] holds the market state (pairs and balances) and executes
//! orders against it. [`TestExchange`] is the deterministic simulation used by
//! the backtester: market orders fill instantly at the pair's current price.

mod test_exchange;

pub use test_exchange::*;

use crate::{
    engine::{Balance, Pair},
    errors::{Error, Result},
};

/// Market state holder and order executor.
///
/// Lookups of unknown symbols or currencies fail with [`Error::Missing`];
/// an order that would overdraw a balance fails with [`Error::NegativeBalance`].
pub trait Exchange {
    /// Current exchange time in milliseconds.
    fn current_time(&self) -> i64;

    /// Returns the pair traded under `symbol`.
    fn pair(&self, symbol: &str) -> Result<&Pair>;

    /// Returns the balance held in `currency`.
    fn balance(&self, currency: &str) -> Result<&Balance>;

    /// Buys `amount` of the base currency at the current price.
    fn market_buy(&mut self, symbol: &str, amount: f64) -> Result<()>;

    /// Sells `amount` of the base currency at the current price.
    fn market_sell(&mut self, symbol: &str, amount: f64) -> Result<()>;

    /// Limit orders are not supported by default.
    fn limit_buy(&mut self, _symbol: &str, _amount: f64, _price: f64) -> Result<()> {
        Err(Error::Unimplemented("Exchange::limit_buy"))
    }

    /// Limit orders are not supported by default.
    fn limit_sell(&mut self, _symbol: &str, _amount: f64, _price: f64) -> Result<()> {
        Err(Error::Unimplemented("Exchange::limit_sell"))
    }

    /// Current price of `symbol`.
    fn current_price(&self, symbol: &str) -> Result<f64> {
        Ok(self.pair(symbol)?.price())
    }

    /// Base currency balance of `symbol`.
    fn balance_base(&self, symbol: &str) -> Result<f64> {
        self.balance_base_of(self.pair(symbol)?)
    }

    /// Quoted currency balance of `symbol`.
    fn balance_quoted(&self, symbol: &str) -> Result<f64> {
        self.balance_quoted_of(self.pair(symbol)?)
    }

    /// Balance held in the base currency of `pair`.
    fn balance_base_of(&self, pair: &Pair) -> Result<f64> {
        Ok(self.balance(pair.base())?.amount())
    }

    /// Balance held in the quoted currency of `pair`.
    fn balance_quoted_of(&self, pair: &Pair) -> Result<f64> {
        Ok(self.balance(pair.quoted())?.amount())
    }

    /// Quoted balance plus the base balance valued at the current price.
    fn balance_quoted_full(&self, symbol: &str) -> Result<f64> {
        let pair = self.pair(symbol)?;
        let base = self.balance(pair.base())?.amount();
        let quoted = self.balance(pair.quoted())?.amount();
        Ok(quoted + base * pair.price())
    }

    /// Base balance plus the quoted balance converted at the current price.
    ///
    /// Fails with [`Error::InvalidPrice`] while the pair has no positive price.
    fn balance_base_full(&self, symbol: &str) -> Result<f64> {
        let pair = self.pair(symbol)?;
        let price = pair.price();
        if price <= 0.0 || !price.is_finite() {
            return Err(Error::InvalidPrice(price));
        }
        let base = self.balance(pair.base())?.amount();
        let quoted = self.balance(pair.quoted())?.amount();
        Ok(quoted / price + base)
    }
}
