//! # promscatter-client
//!
//! HTTP plumbing for fetching Prometheus range queries while watching the
//! response arrive.
//!
//! ## Components
//!
//! - **[`Transport`]**: one request/response exchange with a streaming
//!   [`Body`]; [`HttpTransport`] is the `reqwest` implementation
//! - **[`TeeTransport`]**: decorates any transport so each response body is
//!   also drawn as a live throughput sparkline ([`StreamTap`]) on stderr
//! - **[`PrometheusClient`]**: `query_range` over any transport, decoding the
//!   API envelope into [`QueryResult`](promscatter_types::QueryResult)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use promscatter_client::{HttpTransport, PrometheusClient, Range, RangeQuery, TeeTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = TeeTransport::new(HttpTransport::new());
//!     let client = PrometheusClient::new("http://localhost:9090", transport)?;
//!
//!     let range = Range::back_from_now(
//!         Duration::from_secs(7200),
//!         Duration::from_secs(1),
//!         Duration::from_secs(20),
//!     );
//!     let result = client.query_range("up", range, &CancellationToken::new()).await?;
//!
//!     println!("received a {} result", result.result_type());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod prometheus;
pub mod spark;
pub mod tee;
pub mod transport;

pub use error::{ClientError, TransportError};
pub use prometheus::{PrometheusClient, Range, RangeQuery};
pub use spark::StreamTap;
pub use tee::{Sink, TeeBody, TeeTransport};
pub use transport::{Body, BodyStream, HttpTransport, Response, Transport};

// Re-export types for convenience
pub use promscatter_types::{QueryResult, ResultType, Sample, Series};
