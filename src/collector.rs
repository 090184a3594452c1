//! Annotation sink.
//!
//! The engine reports priced events (balance samples, fills, rejections) to a
//! [`SeriesCollector`] and never cares how they are rendered. [`Recorder`]
//! keeps them in memory, [`NullCollector`] drops them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Series an annotation belongs to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    /// Mark-to-market equity of the strategy, in the quoted currency.
    Equity,
    /// Filled market buys.
    Buy,
    /// Filled market sells.
    Sell,
    /// Rejected orders.
    Error,
    /// Strategy-defined series.
    Custom(u32),
}

/// Color hint for labels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelColor {
    Green,
    Red,
    Yellow,
    Blue,
}

/// Receiver for priced events.
pub trait SeriesCollector {
    /// Appends a plain sample to `series`.
    fn append_point(&mut self, series: Series, timestamp: i64, value: f64);

    /// Appends a labelled sample to `series`.
    fn append_label(&mut self, series: Series, timestamp: i64, value: f64, text: &str, color: LabelColor);
}

/// Collector that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCollector;

impl SeriesCollector for NullCollector {
    fn append_point(&mut self, _series: Series, _timestamp: i64, _value: f64) {}

    fn append_label(&mut self, _series: Series, _timestamp: i64, _value: f64, _text: &str, _color: LabelColor) {}
}

/// One recorded annotation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// A plain sample.
    Point {
        series: Series,
        timestamp: i64,
        value: f64,
    },
    /// A labelled sample.
    Label {
        series: Series,
        timestamp: i64,
        value: f64,
        text: String,
        color: LabelColor,
    },
}

impl Annotation {
    pub fn series(&self) -> Series {
        match self {
            Self::Point { series, .. } | Self::Label { series, .. } => *series,
        }
    }
}

/// In-memory collector, in arrival order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recorder {
    annotations: Vec<Annotation>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over every annotation.
    pub fn annotations(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    /// Returns the annotations of a single series.
    pub fn series(&self, series: Series) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.series() == series)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

impl SeriesCollector for Recorder {
    fn append_point(&mut self, series: Series, timestamp: i64, value: f64) {
        self.annotations.push(Annotation::Point {
            series,
            timestamp,
            value,
        });
    }

    fn append_label(&mut self, series: Series, timestamp: i64, value: f64, text: &str, color: LabelColor) {
        self.annotations.push(Annotation::Label {
            series,
            timestamp,
            value,
            text: text.to_owned(),
            color,
        });
    }
}

#[cfg(test)]
#[test]
fn recorder_keeps_order() {
    let mut recorder = Recorder::new();
    recorder.append_point(Series::Equity, 1, 100.0);
    recorder.append_label(Series::Buy, 2, 10.0, "buy 1", LabelColor::Green);
    recorder.append_point(Series::Equity, 3, 101.0);

    assert_eq!(recorder.len(), 3);
    assert_eq!(recorder.series(Series::Equity).count(), 2);
    assert!(matches!(
        recorder.annotations().nth(1),
        Some(Annotation::Label { text, .. }) if text == "buy 1"
    ));
}
