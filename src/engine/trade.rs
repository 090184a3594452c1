#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single executed trade on the tape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    volume: f64,
    price: f64,
    timestamp: i64,
}

impl From<(i64, f64, f64)> for Trade {
    fn from((timestamp, price, volume): (i64, f64, f64)) -> Self {
        Self {
            volume,
            price,
            timestamp,
        }
    }
}

impl Trade {
    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Execution time in milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}
