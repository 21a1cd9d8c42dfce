//! # promscatter-types
//!
//! Result types for Prometheus range and instant queries: samples, labeled
//! series and the closed set of result shapes a query can produce. Also home
//! to the human-readable duration and byte-size helpers shared by the client
//! and the plotting code.
//!
//! ## Features
//!
//! - `serde`: decode and encode the Prometheus JSON wire format
//!
//! ## Example
//!
//! ```rust
//! use promscatter_types::{Metric, QueryResult, ResultType, Sample, Series};
//!
//! let series = Series::new(Metric::new(), vec![Sample::new(1_000_000, 0.5)]);
//! let result = QueryResult::Matrix(vec![series]);
//!
//! assert_eq!(result.result_type(), ResultType::Matrix);
//! ```

pub mod humanize;
mod result;
mod sample;

pub use humanize::{format_bytes, format_duration, parse_duration, ParseDurationError};
pub use result::*;
pub use sample::{format_timestamp_ms, format_value, Metric, Sample, Series};
