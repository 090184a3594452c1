#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fee rates charged on fills, as fractions (`0.001` is 0.1%).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fees {
    market_buy: f64,
    market_sell: f64,
    limit_buy: f64,
    limit_sell: f64,
}

impl Fees {
    /// Creates fees from one rate per kind of fill.
    pub fn new(market_buy: f64, market_sell: f64, limit_buy: f64, limit_sell: f64) -> Self {
        Self {
            market_buy,
            market_sell,
            limit_buy,
            limit_sell,
        }
    }

    /// Same rate for every kind of fill.
    pub fn flat(rate: f64) -> Self {
        Self::new(rate, rate, rate, rate)
    }

    /// Rate charged on market buy fills.
    pub fn market_buy(&self) -> f64 {
        self.market_buy
    }

    /// Rate charged on market sell fills.
    pub fn market_sell(&self) -> f64 {
        self.market_sell
    }

    /// Rate charged on limit buy fills.
    pub fn limit_buy(&self) -> f64 {
        self.limit_buy
    }

    /// Rate charged on limit sell fills.
    pub fn limit_sell(&self) -> f64 {
        self.limit_sell
    }
}
