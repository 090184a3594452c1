use std::collections::BTreeMap;

use tracing::debug;

use super::Exchange;
use crate::{
    engine::{Balance, Fees, Pair},
    errors::{Error, Result},
};

/// Deterministic simulated exchange.
///
/// Pairs and balances are registered once at construction. Afterwards only
/// order execution mutates balances, and only the backtester moves the clock
/// and the prices.
///
/// ### Example
/// ```rust
/// use std::sync::Arc;
///
/// use candle_bts::prelude::*;
///
/// let fees = Arc::new(Fees::flat(0.001));
/// let exchange = TestExchange::new()
///     .with_pair("BTCUSD", Pair::new("BTC", "USD", fees))
///     .unwrap()
///     .with_balance("BTC", Balance::new(0.0).unwrap())
///     .unwrap()
///     .with_balance("USD", Balance::new(1_000.0).unwrap())
///     .unwrap();
/// assert_eq!(exchange.balance_quoted("BTCUSD").unwrap(), 1_000.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestExchange {
    pairs: BTreeMap<String, Pair>,
    balances: BTreeMap<String, Balance>,
    current_time: i64,
}

impl TestExchange {
    /// Creates an exchange without pairs nor balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pair` under `symbol`. Symbols are unique.
    pub fn with_pair(mut self, symbol: impl Into<String>, pair: Pair) -> Result<Self> {
        let symbol = symbol.into();
        if self.pairs.contains_key(&symbol) {
            return Err(Error::Duplicate { kind: "pair", key: symbol });
        }
        self.pairs.insert(symbol, pair);
        Ok(self)
    }

    /// Registers the balance held in `currency`. Currencies are unique.
    pub fn with_balance(mut self, currency: impl Into<String>, balance: Balance) -> Result<Self> {
        let currency = currency.into();
        if self.balances.contains_key(&currency) {
            return Err(Error::Duplicate {
                kind: "currency",
                key: currency,
            });
        }
        self.balances.insert(currency, balance);
        Ok(self)
    }

    /// Returns an iterator over the registered pairs, ordered by symbol.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Pair)> {
        self.pairs.iter().map(|(symbol, pair)| (symbol.as_str(), pair))
    }

    /// Returns an iterator over the balances, ordered by currency.
    pub fn balances(&self) -> impl Iterator<Item = (&str, &Balance)> {
        self.balances.iter().map(|(currency, balance)| (currency.as_str(), balance))
    }

    pub(crate) fn set_current_time(&mut self, time: i64) {
        self.current_time = time;
    }

    pub(crate) fn set_price(&mut self, symbol: &str, price: f64) -> Result<()> {
        self.pairs
            .get_mut(symbol)
            .ok_or_else(|| Error::missing("pair", symbol))?
            .set_price(price);
        Ok(())
    }

    fn balance_mut(&mut self, currency: &str) -> Result<&mut Balance> {
        self.balances
            .get_mut(currency)
            .ok_or_else(|| Error::missing("currency", currency))
    }

    // Resolves everything an order needs before any balance is touched, so a
    // lookup failure or an unusable price never leaves a half-applied order.
    fn order_context(&self, symbol: &str, amount: f64) -> Result<(String, String, f64, Fees)> {
        if amount < 0.0 || !amount.is_finite() {
            return Err(Error::InvalidAmount(amount));
        }
        let pair = self.pair(symbol)?;
        let price = pair.price();
        if price <= 0.0 || !price.is_finite() {
            return Err(Error::InvalidPrice(price));
        }
        self.balance(pair.base())?;
        self.balance(pair.quoted())?;
        Ok((pair.base().to_owned(), pair.quoted().to_owned(), price, *pair.fees()))
    }
}

impl Exchange for TestExchange {
    fn current_time(&self) -> i64 {
        self.current_time
    }

    fn pair(&self, symbol: &str) -> Result<&Pair> {
        self.pairs.get(symbol).ok_or_else(|| Error::missing("pair", symbol))
    }

    fn balance(&self, currency: &str) -> Result<&Balance> {
        self.balances
            .get(currency)
            .ok_or_else(|| Error::missing("currency", currency))
    }

    /// Debits `amount * price` quoted, then credits `amount - amount * fee` base.
    ///
    /// If the debit fails nothing changes. If the credit fails it rolls itself
    /// back, but the debit already applied to the quoted balance stays.
    fn market_buy(&mut self, symbol: &str, amount: f64) -> Result<()> {
        let (base, quoted, price, fees) = self.order_context(symbol, amount)?;
        let cost = amount * price;
        let fee = amount * fees.market_buy();

        self.balance_mut(&quoted)?.decrement(cost)?;
        self.balance_mut(&base)?.increment(amount - fee)?;
        debug!(symbol, amount, price, cost, fee, "market buy filled");
        Ok(())
    }

    /// Debits `amount` base, then credits `amount * price - fee` quoted.
    fn market_sell(&mut self, symbol: &str, amount: f64) -> Result<()> {
        let (base, quoted, price, fees) = self.order_context(symbol, amount)?;
        let cost = amount * price;
        let fee = cost * fees.market_sell();

        self.balance_mut(&base)?.decrement(amount)?;
        self.balance_mut(&quoted)?.increment(cost - fee)?;
        debug!(symbol, amount, price, cost, fee, "market sell filled");
        Ok(())
    }
}
