use chrono::{DateTime, SecondsFormat};

/// Formats a millisecond timestamp as RFC 3339, or the raw number when out of range.
pub fn format_ms(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(feature = "serde")]
/// Reads a JSON document from `filepath`.
pub fn read_json<T: serde::de::DeserializeOwned>(filepath: &std::path::Path) -> crate::errors::Result<T> {
    use crate::errors::Error;
    use std::{fs::File, io::BufReader};

    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(Error::from)
}

#[cfg(test)]
#[test]
fn format() {
    assert_eq!(format_ms(0), "1970-01-01T00:00:00.000Z");
    assert_eq!(format_ms(1_609_459_259_999), "2021-01-01T00:00:59.999Z");
    assert_eq!(format_ms(i64::MAX), i64::MAX.to_string());
}
