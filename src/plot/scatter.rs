//! Scatter plot rendering with plotters.
//!
//! [`ScatterRenderer`] draws a [`PlotSpec`] and a point set to a PNG:
//! a linear time X axis, a base-10 logarithmic Y axis, and one small plus
//! glyph per point. Axis ticks and labels come from [`TickSource`]s, so the
//! grid lines sit exactly where the tick pipeline puts them.

use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::flatten::Point;
use super::ticks::{LinearTicks, LogTicks, ReadableTime, Tick, TickSource, Units};

/// Default canvas: 16 × 12 inches at 96 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (16 * 96, 12 * 96);

const MARKER_COLOR: RGBColor = RGBColor(166, 189, 219);
const MARKER_ARM: i32 = 2;

/// Errors that can occur when building or rendering a plot.
#[derive(Debug, Error)]
pub enum PlotError {
    /// The plot description is incomplete or inconsistent.
    #[error("Invalid plot: {0}")]
    Validation(String),

    /// The destination cannot be written.
    #[error("Cannot write plot to {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The drawing backend failed.
    #[error("Rendering failed: {0}")]
    Render(String),
}

/// Everything needed to draw one plot, apart from the points.
pub struct PlotSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub size: (u32, u32),
    pub path: PathBuf,
    x_ticks: Box<dyn TickSource>,
    y_ticks: Box<dyn TickSource>,
}

impl PlotSpec {
    /// Start building a spec.
    pub fn builder() -> PlotSpecBuilder {
        PlotSpecBuilder::default()
    }

    /// Tick source for the X axis.
    pub fn x_ticks(&self) -> &dyn TickSource {
        self.x_ticks.as_ref()
    }

    /// Tick source for the Y axis.
    pub fn y_ticks(&self) -> &dyn TickSource {
        self.y_ticks.as_ref()
    }
}

impl std::fmt::Debug for PlotSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotSpec")
            .field("title", &self.title)
            .field("x_label", &self.x_label)
            .field("y_label", &self.y_label)
            .field("size", &self.size)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PlotSpec`].
///
/// Defaults: X label `"Date"` with RFC3339 ticks truncated to one second,
/// Y label `"log10"` with logarithmic ticks labeled per [`Units`], and a
/// 1536×1152 canvas. A destination path is required.
pub struct PlotSpecBuilder {
    title: String,
    x_label: String,
    y_label: String,
    units: Units,
    size: (u32, u32),
    path: Option<PathBuf>,
    x_ticks: Option<Box<dyn TickSource>>,
    y_ticks: Option<Box<dyn TickSource>>,
}

impl Default for PlotSpecBuilder {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: "Date".to_string(),
            y_label: "log10".to_string(),
            units: Units::default(),
            size: DEFAULT_SIZE,
            path: None,
            x_ticks: None,
            y_ticks: None,
        }
    }
}

impl PlotSpecBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    /// Unit rule for the default Y ticks. Ignored when `y_ticks` is set.
    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Canvas size in pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Destination file. The extension selects the image format.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn x_ticks(mut self, ticks: impl TickSource + 'static) -> Self {
        self.x_ticks = Some(Box::new(ticks));
        self
    }

    pub fn y_ticks(mut self, ticks: impl TickSource + 'static) -> Self {
        self.y_ticks = Some(Box::new(ticks));
        self
    }

    pub fn build(self) -> Result<PlotSpec, PlotError> {
        let path = self
            .path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| PlotError::Validation("missing destination path".to_string()))?;
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(PlotError::Validation(format!(
                "canvas size must be positive, got {}x{}",
                self.size.0, self.size.1
            )));
        }

        let x_ticks: Box<dyn TickSource> = match self.x_ticks {
            Some(ticks) => ticks,
            None => Box::new(ReadableTime::new(
                LinearTicks::default(),
                Duration::from_secs(1),
            )),
        };
        let y_ticks = match self.y_ticks {
            Some(ticks) => ticks,
            None => self.units.wrap(Box::new(LogTicks)),
        };

        Ok(PlotSpec {
            title: self.title,
            x_label: self.x_label,
            y_label: self.y_label,
            size: self.size,
            path,
            x_ticks,
            y_ticks,
        })
    }
}

/// Draws plots. The seam between the orchestrator and the drawing library.
pub trait Renderer: Send + Sync {
    fn render(&self, spec: &PlotSpec, points: &[Point]) -> Result<(), PlotError>;
}

/// [`Renderer`] backed by the plotters bitmap backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScatterRenderer;

impl ScatterRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for ScatterRenderer {
    fn render(&self, spec: &PlotSpec, points: &[Point]) -> Result<(), PlotError> {
        check_destination(&spec.path)?;

        let points: Vec<&Point> = points
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.y > 0.0)
            .collect();

        // Draw next to the destination and move into place once saved.
        let partial = partial_path(&spec.path);
        if let Err(err) = draw(spec, &partial, &points) {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", partial.display(), cleanup);
                }
            }
            return Err(err);
        }
        fs::rename(&partial, &spec.path).map_err(|e| PlotError::Io {
            path: spec.path.clone(),
            reason: e.to_string(),
        })
    }
}

fn draw(spec: &PlotSpec, path: &Path, points: &[&Point]) -> Result<(), PlotError> {
    let (x_axis, y_axis) = axes(spec, points);
    debug!(
        points = points.len(),
        x = ?x_axis.range(),
        y = ?y_axis.range(),
        "rendering scatter plot"
    );

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let x_labels = x_axis.ticks.clone();
    let y_labels = y_axis.ticks.clone();
    let x_count = x_axis.major_count();
    let y_count = y_axis.major_count();

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d(x_axis, y_axis)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(x_count)
        .y_labels(y_count)
        .x_label_formatter(&|v| label_at(&x_labels, *v))
        .y_label_formatter(&|v| label_at(&y_labels, *v))
        .bold_line_style(BLACK.mix(0.2))
        .light_line_style(BLACK.mix(0.06))
        .draw()
        .map_err(render_error)?;

    let style = MARKER_COLOR.mix(0.6).stroke_width(1);
    chart
        .draw_series(points.iter().map(|p| {
            EmptyElement::at((p.x, p.y))
                + PathElement::new(vec![(-MARKER_ARM, 0), (MARKER_ARM, 0)], style)
                + PathElement::new(vec![(0, -MARKER_ARM), (0, MARKER_ARM)], style)
        }))
        .map_err(render_error)?;

    root.present().map_err(|e| PlotError::Io {
        path: spec.path.clone(),
        reason: e.to_string(),
    })
}

// Hidden sibling of `path` that keeps its extension, so the backend picks
// the same image format.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".partial-{}", name))
}

fn render_error<E: std::error::Error + Send + Sync>(
    err: DrawingAreaErrorKind<E>,
) -> PlotError {
    PlotError::Render(err.to_string())
}

fn check_destination(path: &Path) -> Result<(), PlotError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    if parent.is_dir() {
        Ok(())
    } else {
        Err(PlotError::Io {
            path: path.to_path_buf(),
            reason: format!("directory {} does not exist", parent.display()),
        })
    }
}

// Find the label of the tick sitting at `value`.
fn label_at(ticks: &[Tick], value: f64) -> String {
    let scale = value.abs().max(1.0);
    ticks
        .iter()
        .find(|t| (t.value - value).abs() <= scale * 1e-9)
        .map(|t| t.label.clone())
        .unwrap_or_default()
}

fn axes(spec: &PlotSpec, points: &[&Point]) -> (TickedAxis, TickedAxis) {
    let (x_min, x_max) = extent(points.iter().map(|p| p.x)).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = if x_min == x_max {
        (x_min - 1.0, x_max + 1.0)
    } else {
        (x_min, x_max)
    };
    let x_axis = TickedAxis::linear(x_min, x_max, spec.x_ticks().ticks(x_min, x_max));

    let (y_min, y_max) = extent(points.iter().map(|p| p.y)).unwrap_or((1.0, 10.0));
    // The log axis spans whole decades.
    let (y_min, y_max) = (
        10f64.powf(y_min.log10().floor()),
        10f64.powf(y_max.log10().ceil()),
    );
    let (y_min, y_max) = if y_min == y_max {
        (y_min / 10.0, y_max * 10.0)
    } else {
        (y_min, y_max)
    };
    let y_axis = TickedAxis::log(y_min, y_max, spec.y_ticks().ticks(y_min, y_max));

    (x_axis, y_axis)
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Plotters coordinate whose key points are a fixed tick list. Mapping is
/// delegated to plotters' linear or logarithmic coordinate.
struct TickedAxis {
    coord: Scale,
    ticks: Vec<Tick>,
}

enum Scale {
    Linear(RangedCoordf64),
    Log(LogCoord<f64>),
}

impl TickedAxis {
    fn linear(min: f64, max: f64, mut ticks: Vec<Tick>) -> Self {
        ticks.retain(|t| t.value >= min && t.value <= max);
        Self {
            coord: Scale::Linear((min..max).into()),
            ticks,
        }
    }

    fn log(min: f64, max: f64, mut ticks: Vec<Tick>) -> Self {
        ticks.retain(|t| t.value >= min && t.value <= max && t.value > 0.0);
        Self {
            coord: Scale::Log((min..max).log_scale().into()),
            ticks,
        }
    }

    fn major_count(&self) -> usize {
        self.ticks.iter().filter(|t| !t.is_minor()).count().max(1)
    }
}

impl Ranged for TickedAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        match &self.coord {
            Scale::Linear(coord) => coord.map(value, limit),
            Scale::Log(coord) => coord.map(value, limit),
        }
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        let light = hint.weight().allow_light_points();
        self.ticks
            .iter()
            .filter(|t| light || !t.is_minor())
            .map(|t| t.value)
            .collect()
    }

    fn range(&self) -> Range<f64> {
        match &self.coord {
            Scale::Linear(coord) => coord.range(),
            Scale::Log(coord) => coord.range(),
        }
    }
}
