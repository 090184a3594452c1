use std::sync::Arc;

use super::Fees;

/// A tradable base/quoted combination, e.g. `BTC` quoted in `USD`.
///
/// The price is the last close seen by the backtester and is what market
/// orders fill at.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    base: String,
    quoted: String,
    fees: Arc<Fees>,
    price: f64,
}

impl Pair {
    /// Creates a pair with no price yet (`0.0`).
    pub fn new(base: impl Into<String>, quoted: impl Into<String>, fees: Arc<Fees>) -> Self {
        Self {
            base: base.into(),
            quoted: quoted.into(),
            fees,
            price: 0.0,
        }
    }

    /// Currency being bought or sold.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Currency the price is expressed in.
    pub fn quoted(&self) -> &str {
        &self.quoted
    }

    /// Fee rates applied to fills on this pair.
    pub fn fees(&self) -> &Fees {
        &self.fees
    }

    /// Last close price, `0.0` before the first candle.
    pub fn price(&self) -> f64 {
        self.price
    }

    pub(crate) fn set_price(&mut self, price: f64) {
        self.price = price;
    }
}

#[cfg(test)]
#[test]
fn shared_fees() {
    let fees = Arc::new(Fees::flat(0.001));
    let btc = Pair::new("BTC", "USD", Arc::clone(&fees));
    let eth = Pair::new("ETH", "USD", Arc::clone(&fees));
    assert_eq!(btc.fees(), eth.fees());
    assert_eq!(Arc::strong_count(&fees), 3);
    assert_eq!(btc.price(), 0.0);
}
