use super::{CandleHistory, History, HistoryRange, Progress, aggregate_trades};
use crate::{
    engine::{Candle, Trade},
    errors::{Error, Result},
};

/// Supplier of a chronologically sorted trade tape.
pub trait TradeSource {
    /// Returns the trades of `range`, oldest first.
    fn fetch(&mut self, range: &HistoryRange, progress: &mut dyn Progress) -> Result<Vec<Trade>>;
}

/// Trade tape already in memory.
#[derive(Debug, Clone, Default)]
pub struct VecTrades(Vec<Trade>);

impl From<Vec<Trade>> for VecTrades {
    fn from(trades: Vec<Trade>) -> Self {
        Self(trades)
    }
}

impl TradeSource for VecTrades {
    fn fetch(&mut self, _range: &HistoryRange, progress: &mut dyn Progress) -> Result<Vec<Trade>> {
        if !progress.update_percent(100) {
            return Err(Error::LoadCancelled);
        }
        Ok(self.0.clone())
    }
}

/// Candle history aggregated from a trade tape on load.
///
/// ### Example
/// ```rust
/// use candle_bts::prelude::*;
///
/// let tape = vec![Trade::from((0, 10.0, 1.0)), Trade::from((70, 9.0, 1.0))];
/// let range = HistoryRange::new("BTCUSD", 0, 120, 60).unwrap();
/// let mut history = TradeCandleHistory::new(range, VecTrades::from(tape));
/// history.load(&mut NoProgress).unwrap();
/// assert_eq!(history.candles().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TradeCandleHistory<S: TradeSource> {
    range: HistoryRange,
    source: S,
    trades: Vec<Trade>,
    candles: Vec<Candle>,
}

impl<S: TradeSource> TradeCandleHistory<S> {
    pub fn new(range: HistoryRange, source: S) -> Self {
        Self {
            range,
            source,
            trades: Vec::new(),
            candles: Vec::new(),
        }
    }

    /// Returns the raw tape the candles were built from.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }
}

impl<S: TradeSource> History for TradeCandleHistory<S> {
    fn range(&self) -> &HistoryRange {
        &self.range
    }

    fn load(&mut self, progress: &mut dyn Progress) -> Result<()> {
        let trades = self.source.fetch(&self.range, progress)?;
        let candles = aggregate_trades(&trades, self.range.start(), self.range.end(), self.range.period())?;
        self.trades = trades;
        self.candles = candles;
        Ok(())
    }

    fn reload(&mut self, progress: &mut dyn Progress) -> Result<()> {
        self.trades.clear();
        self.candles.clear();
        self.load(progress)
    }
}

impl<S: TradeSource> CandleHistory for TradeCandleHistory<S> {
    fn candles(&self) -> &[Candle] {
        &self.candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoProgress;

    #[test]
    fn load_aggregates() {
        let tape = [(0, 10.0, 1.0), (30, 12.0, 1.0), (70, 9.0, 1.0)]
            .map(Trade::from)
            .to_vec();
        let range = HistoryRange::new("BTCUSD", 0, 180, 60).unwrap();
        let mut history = TradeCandleHistory::new(range, VecTrades::from(tape));

        assert!(history.candles().is_empty());
        history.load(&mut NoProgress).unwrap();

        assert_eq!(history.trades().len(), 3);
        assert_eq!(history.candles().len(), 2);
        assert_eq!(history.candles()[1].open(), 9.0);

        history.reload(&mut NoProgress).unwrap();
        assert_eq!(history.candles().len(), 2);
    }
}
