//! Turning matrix results into a scatter plot image.
//!
//! ## Submodules
//!
//! - [`ticks`]: Tick generation and readable label rules (durations, bytes, timestamps)
//! - [`flatten`]: Flattening series into floored `(x, y)` points
//! - [`scatter`]: Plot description ([`PlotSpec`]) and the plotters-backed [`ScatterRenderer`]
//!
//! ## Data Flow
//!
//! ```text
//! QueryResult::Matrix(Vec<Series>)
//!        │
//!        ▼
//! flatten(series, floor) ──▶ Vec<Point>
//!        │
//!        ▼
//! PlotSpec (title, TickSource per axis, path)
//!        │
//!        ▼
//! Renderer::render() ──▶ PNG
//! ```

pub mod flatten;
pub mod scatter;
pub mod ticks;

pub use flatten::{count_points, flatten, Point};
pub use scatter::{PlotError, PlotSpec, PlotSpecBuilder, Renderer, ScatterRenderer};
pub use ticks::{
    LinearTicks, LogTicks, ReadableBytes, ReadableDuration, ReadableTime, Tick, TickSource, Units,
};
