//! Query result shapes.

use core::fmt;

use crate::{Metric, Sample, Series};

/// A single numeric value at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Sample", into = "Sample"))]
pub struct Scalar {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub value: f64,
}

impl From<Sample> for Scalar {
    fn from(sample: Sample) -> Self {
        Self {
            timestamp_ms: sample.timestamp_ms,
            value: sample.value,
        }
    }
}

impl From<Scalar> for Sample {
    fn from(scalar: Scalar) -> Self {
        Sample::new(scalar.timestamp_ms, scalar.value)
    }
}

/// A string value at a point in time.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "crate::sample::wire::Pair", into = "crate::sample::wire::Pair"))]
pub struct StringValue {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub value: String,
}

#[cfg(feature = "serde")]
impl From<crate::sample::wire::Pair> for StringValue {
    fn from(pair: crate::sample::wire::Pair) -> Self {
        Self {
            timestamp_ms: crate::sample::wire::seconds_to_millis(pair.0),
            value: pair.1,
        }
    }
}

#[cfg(feature = "serde")]
impl From<StringValue> for crate::sample::wire::Pair {
    fn from(value: StringValue) -> Self {
        crate::sample::wire::Pair(
            crate::sample::wire::millis_to_seconds(value.timestamp_ms),
            value.value,
        )
    }
}

/// One element of an instant vector: a labeled single sample.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorSample {
    #[cfg_attr(feature = "serde", serde(default))]
    pub metric: Metric,
    #[cfg_attr(feature = "serde", serde(rename = "value"))]
    pub sample: Sample,
}

/// Name of a result shape as reported by the backend (`resultType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    Scalar,
    Vector,
    Matrix,
    String,
}

impl ResultType {
    /// Parse a wire name. Returns `None` for shapes this crate does not know.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scalar" => Some(ResultType::Scalar),
            "vector" => Some(ResultType::Vector),
            "matrix" => Some(ResultType::Matrix),
            "string" => Some(ResultType::String),
            _ => None,
        }
    }

    /// The wire name of this shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Scalar => "scalar",
            ResultType::Vector => "vector",
            ResultType::Matrix => "matrix",
            ResultType::String => "string",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded result of a query.
///
/// Closed set of shapes; callers match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Scalar(Scalar),
    Vector(Vec<VectorSample>),
    Matrix(Vec<Series>),
    String(StringValue),
}

impl QueryResult {
    /// The shape of this result.
    pub fn result_type(&self) -> ResultType {
        match self {
            QueryResult::Scalar(_) => ResultType::Scalar,
            QueryResult::Vector(_) => ResultType::Vector,
            QueryResult::Matrix(_) => ResultType::Matrix,
            QueryResult::String(_) => ResultType::String,
        }
    }
}
