//! Historical data sources.
//!
//! A [`History`] covers a fixed `[start, end)` range cut into `period`-wide
//! buckets. [`CandleHistory`] exposes the candles the backtester replays; they
//! are either given directly ([`VecCandleHistory`]), aggregated from a trade
//! tape ([`TradeCandleHistory`]), parsed from CSV ([`CsvCandleHistory`]) or
//! read back from a binary cache ([`CachedCandleHistory`]).
//!
//! `load` populates a history; `reload` throws everything away and loads again.

mod aggregate;
pub mod cache;
pub mod csv;
mod random;
mod trades;

pub use aggregate::*;
pub use cache::CachedCandleHistory;
pub use csv::CsvCandleHistory;
pub use random::*;
pub use trades::*;

use tracing::info;

use crate::{
    engine::Candle,
    errors::{Error, Result},
};

/// Load progress handle.
///
/// Every update returns `false` once the user wants the load cancelled.
pub trait Progress {
    /// Reports progress as a percentage.
    fn update_percent(&mut self, percent: u8) -> bool;

    /// Reports a status message.
    fn update_status(&mut self, status: &str) -> bool;

    /// Reports progress as the position of `at` between `from` and `to`.
    fn update_ratio(&mut self, at: i64, from: i64, to: i64) -> bool {
        self.update_percent(ratio_percent(at, from, to))
    }
}

fn ratio_percent(at: i64, from: i64, to: i64) -> u8 {
    if to <= from {
        return 100;
    }
    let done = (at.saturating_sub(from)) as f64 / (to - from) as f64;
    (done * 100.0).clamp(0.0, 100.0) as u8
}

/// Progress handle that ignores updates and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update_percent(&mut self, _percent: u8) -> bool {
        true
    }

    fn update_status(&mut self, _status: &str) -> bool {
        true
    }
}

/// Progress handle that logs each new percentage and status.
#[derive(Debug, Default, Clone)]
pub struct LogProgress {
    last: Option<u8>,
}

impl Progress for LogProgress {
    fn update_percent(&mut self, percent: u8) -> bool {
        if self.last != Some(percent) {
            self.last = Some(percent);
            info!(percent, "loading history");
        }
        true
    }

    fn update_status(&mut self, status: &str) -> bool {
        info!(status, "loading history");
        true
    }
}

/// Symbol, time range and bucket width of a history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRange {
    symbol: String,
    start: i64,
    end: i64,
    period: i64,
}

impl HistoryRange {
    /// Creates a range. `period` must be strictly positive.
    pub fn new(symbol: impl Into<String>, start: i64, end: i64, period: i64) -> Result<Self> {
        if period <= 0 {
            return Err(Error::InvalidPeriod(period));
        }
        Ok(Self {
            symbol: symbol.into(),
            start,
            end,
            period,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn period(&self) -> i64 {
        self.period
    }

    /// Whether a bucket starting at `time` belongs to the range.
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time < self.end
    }
}

/// Time-ranged, period-bucketed data source.
pub trait History {
    /// The range this history covers.
    fn range(&self) -> &HistoryRange;

    fn symbol(&self) -> &str {
        self.range().symbol()
    }

    fn start(&self) -> i64 {
        self.range().start()
    }

    fn end(&self) -> i64 {
        self.range().end()
    }

    fn period(&self) -> i64 {
        self.range().period()
    }

    /// Populates the history.
    fn load(&mut self, _progress: &mut dyn Progress) -> Result<()> {
        Err(Error::Unimplemented("History::load"))
    }

    /// Drops the loaded data and loads it again from scratch.
    fn reload(&mut self, _progress: &mut dyn Progress) -> Result<()> {
        Err(Error::Unimplemented("History::reload"))
    }
}

/// A history that exposes candles, oldest first.
pub trait CandleHistory: History {
    fn candles(&self) -> &[Candle];
}

/// History over candles already in memory.
#[derive(Debug, Clone)]
pub struct VecCandleHistory {
    range: HistoryRange,
    candles: Vec<Candle>,
}

impl VecCandleHistory {
    pub fn new(range: HistoryRange, candles: Vec<Candle>) -> Self {
        Self { range, candles }
    }
}

impl History for VecCandleHistory {
    fn range(&self) -> &HistoryRange {
        &self.range
    }

    fn load(&mut self, progress: &mut dyn Progress) -> Result<()> {
        if !progress.update_percent(100) {
            return Err(Error::LoadCancelled);
        }
        Ok(())
    }

    fn reload(&mut self, progress: &mut dyn Progress) -> Result<()> {
        self.load(progress)
    }
}

impl CandleHistory for VecCandleHistory {
    fn candles(&self) -> &[Candle] {
        &self.candles
    }
}
