/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine, the histories and the exchange.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A strict candle received a negative value.
    #[error("Candle {field} can not be negative (got: {value})")]
    CandleNegative {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A strict candle received a NaN value.
    #[error("Candle {0} can not be NaN")]
    CandleNaN(&'static str),

    /// A strict candle ends before it starts.
    #[error("Candle start ({start}) is after its end ({end})")]
    CandleTimeRange {
        /// Bucket start in milliseconds.
        start: i64,
        /// Bucket end in milliseconds.
        end: i64,
    },

    /// The low of a strict candle is above its body.
    #[error("Candle low ({low}) is above min(open, close) ({body})")]
    CandleLowAboveBody {
        /// Rejected low.
        low: f64,
        /// `min(open, close)`.
        body: f64,
    },

    /// The high of a strict candle is below its body.
    #[error("Candle high ({high}) is below max(open, close) ({body})")]
    CandleHighBelowBody {
        /// Rejected high.
        high: f64,
        /// `max(open, close)`.
        body: f64,
    },

    /// A balance that can not go negative would have.
    #[error("Balance can not go negative: {0}")]
    NegativeBalance(f64),

    /// A capability that the implementation does not provide.
    #[error("Unimplemented: {0}")]
    Unimplemented(&'static str),

    /// A symbol, pair or currency lookup failed.
    #[error("Missing {kind}: {key}")]
    Missing {
        /// What was looked up (pair, currency, ...).
        kind: &'static str,
        /// The key that was not found.
        key: String,
    },

    /// A pair, a currency or a registry entry was registered twice.
    #[error("Duplicate {kind}: {key}")]
    Duplicate {
        /// What was registered.
        kind: &'static str,
        /// The key that was already present.
        key: String,
    },

    /// A history period must be strictly positive.
    #[error("History period must be positive (got: {0})")]
    InvalidPeriod(i64),

    /// An order amount must be finite and not negative.
    #[error("Order amount must be a finite, non-negative number (got: {0})")]
    InvalidAmount(f64),

    /// A pair price must be finite and strictly positive to value a balance.
    #[error("Pair price must be positive (got: {0})")]
    InvalidPrice(f64),

    /// A balance amount became NaN or infinite.
    #[error("Balance must be a finite number (got: {0})")]
    NonFiniteBalance(f64),

    /// A time bucket does not fit in a millisecond timestamp.
    #[error("Bucket starting at {start} with period {period} overflows the timestamp range")]
    BucketOverflow {
        /// Bucket start in milliseconds.
        start: i64,
        /// Bucket width in milliseconds.
        period: i64,
    },

    /// The user cancelled a history load through its progress handle.
    #[error("History load cancelled")]
    LoadCancelled,

    /// A backtester can only run once.
    #[error("Backtest already ran (state: {0})")]
    AlreadyRan(String),

    /// The binary candle cache ends in the middle of a record.
    #[error("Truncated candle cache: {0} trailing bytes")]
    TruncatedCache(usize),

    /// A CSV row could not be parsed.
    #[error("CSV line {line}: {reason}")]
    Csv {
        /// 1-based line number in the file.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// An unknown name was given to the registry.
    #[error("Unknown {kind}: {name}")]
    UnknownKind {
        /// Registry family (strategy, history).
        kind: &'static str,
        /// The unrecognized name.
        name: String,
    },

    /// The CSV reader failed (I/O or malformed quoting).
    #[error("CSV error: {0}")]
    CsvReader(#[from] csv::Error),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a failed lookup.
    pub fn missing(kind: &'static str, key: impl Into<String>) -> Self {
        Self::Missing { kind, key: key.into() }
    }

    /// Returns `true` for an expected order rejection (not enough funds).
    ///
    /// Rejections are reported to the strategy and the backtest continues;
    /// every other error aborts the run.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NegativeBalance(_))
    }
}

#[cfg(test)]
#[test]
fn balance_message() {
    let err = Error::NegativeBalance(-3.5);
    assert_eq!(err.to_string(), "Balance can not go negative: -3.5");
    assert!(err.is_rejection());
    assert!(!Error::missing("pair", "BTCUSD").is_rejection());
}
