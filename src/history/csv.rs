//! CSV candle ingestion.
//!
//! Expected layout: two header lines, then newest-first rows of
//! `unix,date,symbol,open,high,low,close,volume_base,volume_quoted`.
//! Reading stops at the first row whose `unix` field is not a number.

use std::{fs::File, io::Read, path::PathBuf};

use chrono::DateTime;
use tracing::debug;

use super::{CandleHistory, History, HistoryRange, Progress};
use crate::{
    engine::Candle,
    errors::{Error, Result},
};

const HEADER_RECORDS: usize = 2;
const MIN_FIELDS: usize = 8;
// Below this, `unix` is taken as seconds rather than milliseconds.
const SECONDS_LIMIT: f64 = 1e11;

/// Parses the CSV export from `reader` into candles, oldest first.
///
/// Each candle covers `[unix, unix + period - 1]`. Quoted fields may contain
/// commas.
pub fn parse_candles<R: Read>(reader: R, period: i64) -> Result<Vec<Candle>> {
    if period <= 0 {
        return Err(Error::InvalidPeriod(period));
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for (idx, record) in reader.records().enumerate().skip(HEADER_RECORDS) {
        let record = record?;
        let line = record.position().map_or(idx + 1, |pos| pos.line() as usize);

        let unix = match record.get(0).and_then(|f| f.parse::<f64>().ok()) {
            Some(unix) if unix.is_finite() => unix,
            _ => break,
        };
        let millis = if unix < SECONDS_LIMIT { unix * 1_000.0 } else { unix };
        let start = millis as i64;
        // `as` saturates, the chrono range check catches it
        let in_range = |ms: i64| DateTime::from_timestamp_millis(ms).is_some();
        let end = start
            .checked_add(period - 1)
            .filter(|&end| in_range(start) && in_range(end))
            .ok_or_else(|| Error::Csv {
                line,
                reason: format!("unix out of range: {unix}"),
            })?;

        if record.len() < MIN_FIELDS {
            return Err(Error::Csv {
                line,
                reason: format!("expected at least {MIN_FIELDS} fields, got {}", record.len()),
            });
        }
        let field = |i: usize, name: &str| -> Result<f64> {
            record.get(i).unwrap_or_default().parse::<f64>().map_err(|e| Error::Csv {
                line,
                reason: format!("{name}: {e}"),
            })
        };

        let open = field(3, "open")?;
        let high = field(4, "high")?;
        let low = field(5, "low")?;
        let close = field(6, "close")?;
        let volume = field(7, "volume")?;
        candles.push(Candle::new(open, close, low, high, volume, start, end)?);
    }

    candles.reverse();
    debug!(candles = candles.len(), "parsed csv");
    Ok(candles)
}

/// Candle history read from a CSV export.
#[derive(Debug, Clone)]
pub struct CsvCandleHistory {
    range: HistoryRange,
    path: PathBuf,
    candles: Vec<Candle>,
}

impl CsvCandleHistory {
    pub fn new(range: HistoryRange, path: impl Into<PathBuf>) -> Self {
        Self {
            range,
            path: path.into(),
            candles: Vec::new(),
        }
    }
}

impl History for CsvCandleHistory {
    fn range(&self) -> &HistoryRange {
        &self.range
    }

    fn load(&mut self, progress: &mut dyn Progress) -> Result<()> {
        if !progress.update_status(&format!("reading {}", self.path.display())) {
            return Err(Error::LoadCancelled);
        }
        let mut candles = parse_candles(File::open(&self.path)?, self.range.period())?;
        candles.retain(|c| self.range.contains(c.start()));
        self.candles = candles;

        if !progress.update_percent(100) {
            return Err(Error::LoadCancelled);
        }
        Ok(())
    }

    fn reload(&mut self, progress: &mut dyn Progress) -> Result<()> {
        self.candles.clear();
        self.load(progress)
    }
}

impl CandleHistory for CsvCandleHistory {
    fn candles(&self) -> &[Candle] {
        &self.candles
    }
}
