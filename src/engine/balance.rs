#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Amount held in a single currency.
///
/// The amount is always finite. Unless created with [`Balance::allow_negative`],
/// it never drops below zero either: a mutation that would break this is
/// refused and reported.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Balance {
    amount: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    can_go_negative: bool,
}

impl Balance {
    /// Creates a balance that can not go negative.
    /// Negative or non-finite starting amounts are rejected.
    pub fn new(amount: f64) -> Result<Self> {
        if !amount.is_finite() {
            return Err(Error::NonFiniteBalance(amount));
        }
        if amount < 0.0 {
            return Err(Error::NegativeBalance(amount));
        }

        Ok(Self {
            amount,
            can_go_negative: false,
        })
    }

    /// Creates a balance allowed to go below zero (margin, test fixtures).
    pub fn allow_negative(amount: f64) -> Self {
        Self {
            amount,
            can_go_negative: true,
        }
    }

    /// Returns the amount.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn can_go_negative(&self) -> bool {
        self.can_go_negative
    }

    /// Adds `delta` and returns the new amount.
    ///
    /// Nothing changes if the result would be non-finite
    /// ([`Error::NonFiniteBalance`]), or negative when that is not allowed
    /// ([`Error::NegativeBalance`]).
    pub fn increment(&mut self, delta: f64) -> Result<f64> {
        let next = self.amount + delta;
        if !next.is_finite() {
            return Err(Error::NonFiniteBalance(next));
        }
        if !self.can_go_negative && next < 0.0 {
            return Err(Error::NegativeBalance(next));
        }
        self.amount = next;
        Ok(next)
    }

    /// Subtracts `delta` and returns the new amount. Same rule as [`Balance::increment`].
    pub fn decrement(&mut self, delta: f64) -> Result<f64> {
        self.increment(-delta)
    }
}

#[cfg(test)]
#[test]
fn new_balance_valid_amount() {
    let balance = Balance::new(100.0).unwrap();
    assert_eq!(balance.amount(), 100.0);
    assert!(!balance.can_go_negative());
}

#[cfg(test)]
#[test]
fn new_balance_invalid_amount() {
    let result = Balance::new(-10.0);
    assert!(matches!(result, Err(Error::NegativeBalance(_))));
    assert!(Balance::new(0.0).is_ok());
}

#[cfg(test)]
#[test]
fn increment_and_decrement() {
    let mut balance = Balance::new(100.0).unwrap();
    assert_eq!(balance.increment(50.0).unwrap(), 150.0);
    assert_eq!(balance.decrement(150.0).unwrap(), 0.0);
}

#[cfg(test)]
#[test]
fn decrement_insufficient_funds() {
    let mut balance = Balance::new(100.0).unwrap();
    let result = balance.decrement(150.0);
    assert!(matches!(result, Err(Error::NegativeBalance(amount)) if amount == -50.0));
    assert_eq!(balance.amount(), 100.0);

    let result = balance.increment(-100.5);
    assert!(result.is_err());
    assert_eq!(balance.amount(), 100.0);
}

#[cfg(test)]
#[test]
fn non_finite_rejected() {
    assert!(matches!(Balance::new(f64::NAN), Err(Error::NonFiniteBalance(_))));
    assert!(matches!(Balance::new(f64::INFINITY), Err(Error::NonFiniteBalance(_))));

    let mut balance = Balance::new(100.0).unwrap();
    assert!(matches!(balance.increment(f64::NAN), Err(Error::NonFiniteBalance(_))));
    assert!(matches!(balance.decrement(f64::NAN), Err(Error::NonFiniteBalance(_))));
    assert!(matches!(balance.increment(f64::INFINITY), Err(Error::NonFiniteBalance(_))));
    balance.increment(f64::MAX).unwrap();
    assert!(matches!(balance.increment(f64::MAX), Err(Error::NonFiniteBalance(_))));
    assert!(balance.amount().is_finite());
}

#[cfg(test)]
#[test]
fn non_finite_rejected_when_negative_allowed() {
    let mut balance = Balance::allow_negative(-5.0);
    assert!(matches!(balance.decrement(f64::INFINITY), Err(Error::NonFiniteBalance(_))));
    assert!(matches!(balance.increment(f64::NAN), Err(Error::NonFiniteBalance(_))));
    assert_eq!(balance.amount(), -5.0);
}

#[cfg(test)]
#[test]
fn negative_allowed() {
    let mut balance = Balance::allow_negative(10.0);
    assert_eq!(balance.decrement(25.0).unwrap(), -15.0);
    assert_eq!(balance.increment(20.0).unwrap(), 5.0);
}
