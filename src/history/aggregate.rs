use tracing::debug;

use crate::{
    engine::{Candle, Trade},
    errors::{Error, Result},
};

/// Buckets a chronologically sorted trade tape into candles.
///
/// Buckets are `[current, current + period)` starting at `start`. Each bucket
/// opens at the price of the next unconsumed trade, then consumes every trade
/// stamped before the bucket's upper bound. One candle is emitted per bucket
/// (its `end` is the last millisecond of the bucket) until `current` reaches
/// `end` or the tape runs out.
///
/// A bucket without trades still emits a zero-volume candle priced at the
/// next remaining trade, even though that trade belongs to a later bucket.
///
/// ### Example
/// ```rust
/// use candle_bts::prelude::*;
///
/// let trades = [(0, 10.0, 1.0), (30, 12.0, 2.0), (70, 9.0, 1.0)].map(Trade::from);
/// let candles = aggregate_trades(&trades, 0, 120, 60).unwrap();
/// assert_eq!(candles.len(), 2);
/// assert_eq!(candles[0].close(), 12.0);
/// ```
pub fn aggregate_trades(trades: &[Trade], start: i64, end: i64, period: i64) -> Result<Vec<Candle>> {
    if period <= 0 {
        return Err(Error::InvalidPeriod(period));
    }

    let mut candles = Vec::new();
    let mut cursor = 0;
    let mut current = start;

    while current < end && cursor < trades.len() {
        let bucket_end = current
            .checked_add(period)
            .ok_or(Error::BucketOverflow { start: current, period })?;
        let open = trades[cursor].price();
        let (mut close, mut low, mut high, mut volume) = (open, open, open, 0.0);

        while let Some(trade) = trades.get(cursor).filter(|t| t.timestamp() < bucket_end) {
            close = trade.price();
            low = low.min(close);
            high = high.max(close);
            volume += trade.volume();
            cursor += 1;
        }

        candles.push(Candle::new(open, close, low, high, volume, current, bucket_end - 1)?);
        current = bucket_end;
    }

    debug!(trades = cursor, candles = candles.len(), "aggregated trades");
    Ok(candles)
}
