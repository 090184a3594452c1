//! Binary candle cache.
//!
//! The cache is a flat dump of fixed-size little-endian records with no
//! header: `open, close, low, high, volume` as `f64`, `start, end` as `i64`,
//! then the strict flag on one byte and 7 bytes of padding. Changing this
//! layout breaks every existing cache file.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{CandleHistory, History, HistoryRange, Progress};
use crate::{
    engine::Candle,
    errors::{Error, Result},
};

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 64;

/// Writes `candles` as consecutive records.
pub fn write_candles<W: Write>(mut writer: W, candles: &[Candle]) -> Result<()> {
    for candle in candles {
        let mut record = [0u8; RECORD_SIZE];
        let floats = [candle.open(), candle.close(), candle.low(), candle.high(), candle.volume()];
        for (i, value) in floats.iter().enumerate() {
            record[i * 8..i * 8 + 8].copy_from_slice(&value.to_le_bytes());
        }
        record[40..48].copy_from_slice(&candle.start().to_le_bytes());
        record[48..56].copy_from_slice(&candle.end().to_le_bytes());
        record[56] = u8::from(candle.is_strict());
        writer.write_all(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads records until EOF. Strict records are validated again.
pub fn read_candles<R: Read>(mut reader: R) -> Result<Vec<Candle>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let records = bytes.chunks_exact(RECORD_SIZE);
    let trailing = records.remainder().len();
    if trailing != 0 {
        return Err(Error::TruncatedCache(trailing));
    }

    records
        .map(|record| {
            let [open, close, low, high, volume] = [0, 1, 2, 3, 4].map(|i| f64::from_le_bytes(word(record, i * 8)));
            let start = i64::from_le_bytes(word(record, 40));
            let end = i64::from_le_bytes(word(record, 48));
            if record[56] != 0 {
                Candle::new(open, close, low, high, volume, start, end)
            } else {
                Ok(Candle::relaxed(open, close, low, high, volume, start, end))
            }
        })
        .collect()
}

fn word(record: &[u8], offset: usize) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&record[offset..offset + 8]);
    buf
}

/// Writes `candles` to the cache file at `path`.
pub fn save(path: impl AsRef<Path>, candles: &[Candle]) -> Result<()> {
    let writer = BufWriter::new(File::create(path.as_ref())?);
    write_candles(writer, candles)?;
    debug!(path = %path.as_ref().display(), candles = candles.len(), "saved candle cache");
    Ok(())
}

/// Reads every candle of the cache file at `path`.
pub fn open(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    read_candles(BufReader::new(File::open(path.as_ref())?))
}

/// Candle history backed by a cache file.
#[derive(Debug, Clone)]
pub struct CachedCandleHistory {
    range: HistoryRange,
    path: PathBuf,
    candles: Vec<Candle>,
}

impl CachedCandleHistory {
    pub fn new(range: HistoryRange, path: impl Into<PathBuf>) -> Self {
        Self {
            range,
            path: path.into(),
            candles: Vec::new(),
        }
    }
}

impl History for CachedCandleHistory {
    fn range(&self) -> &HistoryRange {
        &self.range
    }

    fn load(&mut self, progress: &mut dyn Progress) -> Result<()> {
        if !progress.update_status(&format!("reading {}", self.path.display())) {
            return Err(Error::LoadCancelled);
        }
        let mut candles = open(&self.path)?;
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

impl CandleHistory for CachedCandleHistory {
    fn candles(&self) -> &[Candle] {
        &self.candles
    }
}
