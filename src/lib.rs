//! # promscatter
//!
//! Fetch a Prometheus range query and draw it as a scatter plot, while a
//! live sparkline on stderr shows the response body streaming in.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              main                                │
//! │  Args ──▶ Settings ──▶ Orchestrator::run(options, cancel)        │
//! │                              │                                   │
//! │            ┌─────────────────┴───────────────────┐               │
//! │            ▼                                     ▼               │
//! │  ┌───────────────────┐                ┌────────────────────┐     │
//! │  │ PrometheusClient  │                │ plot               │     │
//! │  │  └ TeeTransport ──┼──▶ stderr      │  flatten ─▶ Point  │     │
//! │  │     └ HttpTransport                │  PlotSpec + ticks  │     │
//! │  └───────────────────┘                │  ScatterRenderer ──┼──▶ PNG
//! │                                       └────────────────────┘     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: Command line flags layered over a TOML file and
//!   `PROMSCATTER_*` environment variables
//! - **[`app`]**: The [`Orchestrator`], which issues one range query and
//!   branches on the result shape
//! - **[`plot`]**: Tick generation with readable labels, flattening of
//!   matrix results, and plotters rendering
//! - **[`error`]**: [`AppError`] and [`ConfigError`]
//!
//! The HTTP side lives in `promscatter-client` and the result types in
//! `promscatter-types`.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Last two hours of request rates, byte-labeled Y axis
//! promscatter --addr http://localhost:9090 --units bytes \
//!     'rate(node_network_receive_bytes_total[5m])'
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use promscatter::{Orchestrator, QueryOptions, ScatterRenderer, Units};
//! use promscatter_client::{HttpTransport, PrometheusClient, TeeTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let client = PrometheusClient::new(
//!     "http://localhost:9090",
//!     TeeTransport::new(HttpTransport::new()),
//! )
//! .unwrap();
//! let orchestrator = Orchestrator::new(client, ScatterRenderer::new());
//!
//! let options = QueryOptions {
//!     query: "up".to_string(),
//!     from: Duration::from_secs(3600),
//!     to: Duration::ZERO,
//!     step: Duration::from_secs(10),
//!     out: PathBuf::from("up.png"),
//!     floor: 1.0,
//!     units: Units::Unitless,
//! };
//! let outcome = orchestrator.run(&options, &CancellationToken::new()).await;
//! # });
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod plot;

pub use app::{Orchestrator, Outcome, QueryOptions};
pub use config::{Args, Settings};
pub use error::{AppError, ConfigError};
pub use plot::{PlotError, PlotSpec, Renderer, ScatterRenderer, TickSource, Units};
