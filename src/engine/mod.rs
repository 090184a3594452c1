//! Market value types.
//!
//! This module provides the building blocks shared by the histories, the
//! exchange and the strategies:
//! - `Candle`: OHLCV data over a time bucket, optionally self-validating.
//! - `Trade`: a single tick of the tape.
//! - `Fees`: market and limit fee rates of a pair.
//! - `Balance`: a currency amount with a negative-balance policy.
//! - `Pair`: a base/quoted binding with its current price.
//! - `OrderSide`: buy or sell.

mod balance;
mod candle;
mod fees;
mod order;
mod pair;
mod trade;

pub use balance::*;
pub use candle::*;
pub use fees::*;
pub use order::*;
pub use pair::*;
pub use trade::*;
