//! Samples and labeled series.

use std::collections::BTreeMap;

/// Label set identifying a series, e.g. `{__name__="up", job="node"}`.
pub type Metric = BTreeMap<String, String>;

/// A single `(timestamp, value)` observation.
///
/// On the wire a sample is a two element array of Unix seconds (with
/// millisecond fraction) and the value encoded as a string:
/// `[1435781430.781, "1"]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "wire::Pair", into = "wire::Pair"))]
pub struct Sample {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Observed value. May be NaN or infinite.
    pub value: f64,
}

impl Sample {
    /// Create a sample.
    pub const fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }

    /// Timestamp as whole Unix seconds, rounded towards negative infinity.
    pub const fn unix_seconds(&self) -> i64 {
        self.timestamp_ms.div_euclid(1000)
    }
}

/// An ordered stream of samples belonging to one metric.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    /// Labels of the series.
    #[cfg_attr(feature = "serde", serde(default))]
    pub metric: Metric,
    /// Samples in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub values: Vec<Sample>,
}

impl Series {
    /// Create a series with the given labels and samples.
    pub fn new(metric: Metric, values: Vec<Sample>) -> Self {
        Self { metric, values }
    }

    /// Number of samples in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Format a millisecond timestamp as Unix seconds with the shortest
/// fraction that round-trips, e.g. `1435781451.781` or `1435781451`.
pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    (timestamp_ms as f64 / 1000.0).to_string()
}

/// Format a sample value the way Prometheus writes it.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(feature = "serde")]
pub(crate) mod wire {
    use super::{format_value, Sample};

    /// `[<unix seconds>, "<value>"]`
    #[derive(serde::Serialize, serde::Deserialize)]
    pub(crate) struct Pair(pub f64, pub String);

    pub(crate) fn seconds_to_millis(seconds: f64) -> i64 {
        (seconds * 1000.0).round() as i64
    }

    pub(crate) fn millis_to_seconds(millis: i64) -> f64 {
        millis as f64 / 1000.0
    }

    impl TryFrom<Pair> for Sample {
        type Error = String;

        fn try_from(pair: Pair) -> Result<Self, Self::Error> {
            let value = pair
                .1
                .parse::<f64>()
                .map_err(|e| format!("invalid sample value {:?}: {}", pair.1, e))?;
            Ok(Sample::new(seconds_to_millis(pair.0), value))
        }
    }

    impl From<Sample> for Pair {
        fn from(sample: Sample) -> Self {
            Pair(millis_to_seconds(sample.timestamp_ms), format_value(sample.value))
        }
    }
}
