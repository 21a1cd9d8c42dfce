//! Prometheus HTTP API range queries.
//!
//! Issues `GET /api/v1/query_range` through any [`Transport`] and decodes the
//! JSON envelope into a [`QueryResult`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use promscatter_client::{HttpTransport, PrometheusClient, Range, RangeQuery};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::new("http://localhost:9090", HttpTransport::new())?;
//!     let range = Range::back_from_now(
//!         Duration::from_secs(3600),
//!         Duration::ZERO,
//!         Duration::from_secs(60),
//!     );
//!
//!     let result = client
//!         .query_range("rate(http_requests_total[5m])", range, &CancellationToken::new())
//!         .await?;
//!     println!("got a {} result", result.result_type());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Method, Request, StatusCode, Url};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use promscatter_types::{QueryResult, ResultType};

use crate::transport::Transport;
use crate::{ClientError, TransportError};

const QUERY_RANGE_PATH: &str = "api/v1/query_range";

/// Time window and resolution of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

impl Range {
    /// Window from `from` ago until `to` ago, sampled every `step`.
    pub fn back_from_now(from: Duration, to: Duration, step: Duration) -> Self {
        let now = Utc::now();
        Self {
            start: ago(now, from),
            end: ago(now, to),
            step,
        }
    }
}

fn ago(now: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(offset)
        .ok()
        .and_then(|offset| now.checked_sub_signed(offset))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Runs range queries against a metrics backend.
#[async_trait]
pub trait RangeQuery: Send + Sync {
    /// Evaluate `query` over `range`. A single attempt; cancelling `cancel`
    /// aborts the request.
    async fn query_range(
        &self,
        query: &str,
        range: Range,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, ClientError>;
}

/// Client for the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct PrometheusClient<T> {
    transport: T,
    address: Url,
}

impl<T: Transport> PrometheusClient<T> {
    /// Create a client for the backend at `address` (e.g. "http://localhost:9090").
    pub fn new(address: &str, transport: T) -> Result<Self, ClientError> {
        let mut address = Url::parse(address).map_err(|e| ClientError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        if address.cannot_be_a_base() {
            return Err(ClientError::Address {
                address: address.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        // Keep any path prefix when joining API paths.
        if !address.path().ends_with('/') {
            let path = format!("{}/", address.path());
            address.set_path(&path);
        }
        Ok(Self { transport, address })
    }

    /// The backend base address.
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// The transport used for requests.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn range_url(&self, query: &str, range: &Range) -> Result<Url, ClientError> {
        let mut url = self
            .address
            .join(QUERY_RANGE_PATH)
            .map_err(|e| ClientError::Address {
                address: self.address.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("start", &format_timestamp(range.start))
            .append_pair("end", &format_timestamp(range.end))
            .append_pair("step", &format_step(range.step));
        Ok(url)
    }
}

#[async_trait]
impl<T: Transport> RangeQuery for PrometheusClient<T> {
    async fn query_range(
        &self,
        query: &str,
        range: Range,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, ClientError> {
        let url = self.range_url(query, &range)?;
        debug!(%url, "querying range");

        let mut response = self
            .transport
            .round_trip(Request::new(Method::GET, url), cancel)
            .await?;

        let mut bytes = Vec::new();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            read = response.body.read_to_end(&mut bytes) => read.map_err(TransportError::Io),
        };
        let closed = response.body.close();
        read?;
        closed.map_err(TransportError::Io)?;

        debug!(status = %response.status, bytes = bytes.len(), "received response");
        decode_response(response.status, &bytes)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Option<Data>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(rename = "resultType")]
    result_type: String,
    result: serde_json::Value,
}

/// Decode a Prometheus API response body.
pub fn decode_response(status: StatusCode, body: &[u8]) -> Result<QueryResult, ClientError> {
    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(ClientError::Status(status)),
        Err(e) => return Err(ClientError::Decode(e)),
    };

    for warning in &envelope.warnings {
        warn!(%warning, "backend warning");
    }

    if envelope.status != "success" {
        return Err(ClientError::Api {
            error_type: envelope.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: envelope
                .error
                .unwrap_or_else(|| format!("status {:?}", envelope.status)),
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| ClientError::Malformed("missing data".to_string()))?;
    decode_result(&data.result_type, data.result)
}

fn decode_result(result_type: &str, result: serde_json::Value) -> Result<QueryResult, ClientError> {
    let Some(shape) = ResultType::from_name(result_type) else {
        return Err(ClientError::UnsupportedResult(result_type.to_string()));
    };

    Ok(match shape {
        ResultType::Scalar => QueryResult::Scalar(serde_json::from_value(result)?),
        ResultType::Vector => QueryResult::Vector(serde_json::from_value(result)?),
        ResultType::Matrix => QueryResult::Matrix(serde_json::from_value(result)?),
        ResultType::String => QueryResult::String(serde_json::from_value(result)?),
    })
}

// Unix seconds with millisecond precision.
fn format_timestamp(t: DateTime<Utc>) -> String {
    let millis = t.timestamp_millis();
    format!("{}.{:03}", millis.div_euclid(1000), millis.rem_euclid(1000))
}

fn format_step(step: Duration) -> String {
    step.as_secs_f64().to_string()
}
