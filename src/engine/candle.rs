use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// OHLCV aggregate over the bucket `[start, end]` (milliseconds).
///
/// A *strict* candle validates itself on construction and on every setter:
/// no negative or NaN values, `start <= end`, and a low/high that wrap the body.
/// Relaxed candles skip the checks, which is handy for hand-written fixtures.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    open: f64,
    close: f64,
    low: f64,
    high: f64,
    volume: f64,
    start: i64,
    end: i64,
    strict: bool,
}

impl Candle {
    /// Creates a strict candle.
    pub fn new(open: f64, close: f64, low: f64, high: f64, volume: f64, start: i64, end: i64) -> Result<Self> {
        let candle = Self {
            open,
            close,
            low,
            high,
            volume,
            start,
            end,
            strict: true,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Creates a candle without any validation.
    pub fn relaxed(open: f64, close: f64, low: f64, high: f64, volume: f64, start: i64, end: i64) -> Self {
        Self {
            open,
            close,
            low,
            high,
            volume,
            start,
            end,
            strict: false,
        }
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Bucket start in milliseconds.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Bucket end in milliseconds.
    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start)
    }

    pub fn end_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.end)
    }

    pub fn set_open(&mut self, open: f64) -> Result<()> {
        self.update(|c| c.open = open)
    }

    pub fn set_close(&mut self, close: f64) -> Result<()> {
        self.update(|c| c.close = close)
    }

    pub fn set_low(&mut self, low: f64) -> Result<()> {
        self.update(|c| c.low = low)
    }

    pub fn set_high(&mut self, high: f64) -> Result<()> {
        self.update(|c| c.high = high)
    }

    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.update(|c| c.volume = volume)
    }

    pub fn set_start(&mut self, start: i64) -> Result<()> {
        self.update(|c| c.start = start)
    }

    pub fn set_end(&mut self, end: i64) -> Result<()> {
        self.update(|c| c.end = end)
    }

    /// Switches validation on or off. Turning it on validates the current values.
    pub fn set_strict(&mut self, strict: bool) -> Result<()> {
        self.update(|c| c.strict = strict)
    }

    // Applies `f` to a copy and only commits it if the copy is valid.
    fn update<F: FnOnce(&mut Self)>(&mut self, f: F) -> Result<()> {
        let mut next = *self;
        f(&mut next);
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.strict {
            return Ok(());
        }

        let fields = [
            ("open", self.open),
            ("close", self.close),
            ("low", self.low),
            ("high", self.high),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if value.is_nan() {
                return Err(Error::CandleNaN(field));
            }
            if value < 0.0 {
                return Err(Error::CandleNegative { field, value });
            }
        }

        if self.start > self.end {
            return Err(Error::CandleTimeRange {
                start: self.start,
                end: self.end,
            });
        }

        let body_low = self.open.min(self.close);
        if self.low > body_low {
            return Err(Error::CandleLowAboveBody {
                low: self.low,
                body: body_low,
            });
        }

        let body_high = self.open.max(self.close);
        if self.high < body_high {
            return Err(Error::CandleHighBelowBody {
                high: self.high,
                body: body_high,
            });
        }

        Ok(())
    }
}

/// Fluent constructor for [`Candle`].
///
/// ```rust
/// use candle_bts::prelude::*;
///
/// let candle = CandleBuilder::builder()
///     .open(100.0)
///     .high(110.0)
///     .low(95.0)
///     .close(105.0)
///     .volume(1.0)
///     .start(0)
///     .end(59_999)
///     .build()
///     .unwrap();
/// assert!(candle.is_strict());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CandleBuilder {
    candle: Candle,
}

impl CandleBuilder {
    /// Starts a strict, all-zero candle.
    pub fn builder() -> Self {
        Self {
            candle: Candle::relaxed(0.0, 0.0, 0.0, 0.0, 0.0, 0, 0),
        }
        .strict(true)
    }

    pub fn open(mut self, open: f64) -> Self {
        self.candle.open = open;
        self
    }

    pub fn close(mut self, close: f64) -> Self {
        self.candle.close = close;
        self
    }

    pub fn low(mut self, low: f64) -> Self {
        self.candle.low = low;
        self
    }

    pub fn high(mut self, high: f64) -> Self {
        self.candle.high = high;
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.candle.volume = volume;
        self
    }

    pub fn start(mut self, start: i64) -> Self {
        self.candle.start = start;
        self
    }

    pub fn end(mut self, end: i64) -> Self {
        self.candle.end = end;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.candle.strict = strict;
        self
    }

    /// Builds the candle, validating it when strict.
    pub fn build(self) -> Result<Candle> {
        self.candle.validate()?;
        Ok(self.candle)
    }
}
