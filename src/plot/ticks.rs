//! Axis tick generation and label rewriting.
//!
//! A [`TickSource`] produces ticks for a `[min, max]` range. The base
//! generators ([`LinearTicks`], [`LogTicks`]) take their positions from
//! plotters' own linear and logarithmic coordinates; the readable
//! wrappers ([`ReadableDuration`], [`ReadableBytes`], [`ReadableTime`]) keep
//! those positions and only rewrite labels.
//!
//! ```text
//! LogTicks ──▶ ReadableBytes ──▶ [1 B, 2 B, ..., 10 B, 20 B, ..., 1000 B]
//! ```

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use plotters::coord::ranged1d::{BoldPoints, LightPoints, Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::{IntoLogRange, LogCoord};
use promscatter_types::humanize::{format_bytes_f64, format_duration_nanos};

/// A labeled position on an axis.
///
/// Minor ticks draw a light grid line and start out unlabeled.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
    pub minor: bool,
}

impl Tick {
    /// A labeled tick.
    pub fn major(value: f64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
            minor: false,
        }
    }

    /// An unlabeled tick.
    pub fn minor(value: f64) -> Self {
        Self {
            value,
            label: String::new(),
            minor: true,
        }
    }

    /// Check if this is a minor tick.
    pub fn is_minor(&self) -> bool {
        self.minor
    }
}

/// Produces the ticks for an axis range.
///
/// Implementations are pure: the same bounds always give the same ticks.
pub trait TickSource: Send + Sync {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick>;
}

impl<T: TickSource + ?Sized> TickSource for Box<T> {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        (**self).ticks(min, max)
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        (**self).ticks(min, max)
    }
}

/// Major ticks requested from a base generator.
const LABELS: usize = 8;

/// Light grid lines per major, as plotters' mesh requests them.
const LIGHT_LINES: usize = 10;

/// Linear ticks from plotters' `RangedCoordf64` key points. Majors are
/// labeled with plotters' float formatting; the extra points of the light
/// grid are minor.
#[derive(Debug, Clone, Copy)]
pub struct LinearTicks {
    /// Approximate number of major ticks.
    pub target: usize,
}

impl Default for LinearTicks {
    fn default() -> Self {
        Self { target: LABELS }
    }
}

impl TickSource for LinearTicks {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        if !(max - min).is_finite() || min > max {
            return Vec::new();
        }
        let coord = RangedCoordf64::from(min..max);
        let target = self.target.max(1);
        merge(
            coord.key_points(BoldPoints(target)),
            coord.key_points(LightPoints::new(target, target * LIGHT_LINES)),
            |value| <RangedCoordf64 as ValueFormatter<f64>>::format(&value),
        )
    }
}

/// Base-10 logarithmic ticks from plotters' `LogCoord` key points: powers
/// of ten are major, the multiples plotters fills in between are minor.
/// Non-positive lower bounds fall back to plotters' own zero handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTicks;

impl TickSource for LogTicks {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        if !min.is_finite() || !max.is_finite() || max <= 0.0 || min > max {
            return Vec::new();
        }
        let coord: LogCoord<f64> = (min.max(0.0)..max).log_scale().into();
        let mut light = coord.key_points(LightPoints::new(LABELS, LABELS * LIGHT_LINES));
        light.dedup();
        merge(
            coord.key_points(BoldPoints(LABELS)),
            light,
            |value| <LogCoord<f64> as ValueFormatter<f64>>::format(&value),
        )
    }
}

// Label the bold points and add the light points that are not bold as
// unlabeled minors, in ascending order.
fn merge(bold: Vec<f64>, light: Vec<f64>, label: impl Fn(f64) -> String) -> Vec<Tick> {
    let mut ticks: Vec<Tick> = bold
        .iter()
        .map(|&value| Tick::major(value, label(value)))
        .collect();
    ticks.extend(
        light
            .into_iter()
            .filter(|value| !bold.iter().any(|b| same_position(*b, *value)))
            .map(Tick::minor),
    );
    ticks.sort_by(|a, b| a.value.total_cmp(&b.value));
    ticks
}

fn same_position(a: f64, b: f64) -> bool {
    (a - b).abs() <= a.abs().max(b.abs()) * 1e-9
}

// Rewrite every label, leaving positions alone.
fn relabel(ticks: Vec<Tick>, label: impl Fn(f64) -> String) -> Vec<Tick> {
    ticks
        .into_iter()
        .map(|mut tick| {
            tick.label = label(tick.value);
            tick
        })
        .collect()
}

/// Labels tick values as durations, reading the value as nanoseconds.
#[derive(Debug, Clone)]
pub struct ReadableDuration<S> {
    inner: S,
}

impl<S: TickSource> ReadableDuration<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: TickSource> TickSource for ReadableDuration<S> {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        relabel(self.inner.ticks(min, max), |value| {
            format_duration_nanos(value as i64)
        })
    }
}

/// Labels tick values as binary byte sizes. Negative values read as zero.
#[derive(Debug, Clone)]
pub struct ReadableBytes<S> {
    inner: S,
}

impl<S: TickSource> ReadableBytes<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: TickSource> TickSource for ReadableBytes<S> {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        relabel(self.inner.ticks(min, max), format_bytes_f64)
    }
}

/// Labels tick values as RFC3339 UTC timestamps, reading the value as Unix
/// seconds truncated to a granularity.
#[derive(Debug, Clone)]
pub struct ReadableTime<S> {
    inner: S,
    truncate: Duration,
}

impl<S: TickSource> ReadableTime<S> {
    pub fn new(inner: S, truncate: Duration) -> Self {
        Self { inner, truncate }
    }
}

impl<S: TickSource> TickSource for ReadableTime<S> {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        relabel(self.inner.ticks(min, max), |value| {
            format_time(value, self.truncate)
        })
    }
}

/// Format Unix seconds as RFC3339 in UTC, truncated down to `truncate` on
/// whole milliseconds. A fraction is printed only when one remains.
pub fn format_time(seconds: f64, truncate: Duration) -> String {
    if !seconds.is_finite() {
        return seconds.to_string();
    }
    let millis = (seconds * 1_000.0).floor() as i64;
    let step = i64::try_from(truncate.as_millis()).unwrap_or(i64::MAX);
    let truncated = if step > 1 {
        millis - millis.rem_euclid(step)
    } else {
        millis
    };
    match DateTime::from_timestamp_millis(truncated) {
        Some(time) => time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => seconds.to_string(),
    }
}

/// Unit rule applied to Y axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    Duration,
    Bytes,
    #[default]
    Unitless,
}

impl Units {
    /// Parse a configuration value. Unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "duration" => Some(Units::Duration),
            "bytes" => Some(Units::Bytes),
            "unitless" => Some(Units::Unitless),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Duration => "duration",
            Units::Bytes => "bytes",
            Units::Unitless => "unitless",
        }
    }

    /// Wrap `source` with this unit's label rule. `Unitless` hands `source`
    /// back untouched.
    pub fn wrap(self, source: Box<dyn TickSource>) -> Box<dyn TickSource> {
        match self {
            Units::Duration => Box::new(ReadableDuration::new(source)),
            Units::Bytes => Box::new(ReadableBytes::new(source)),
            Units::Unitless => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed ticks regardless of range.
    struct Fixed(Vec<Tick>);

    impl TickSource for Fixed {
        fn ticks(&self, _min: f64, _max: f64) -> Vec<Tick> {
            self.0.clone()
        }
    }

    fn positions(ticks: &[Tick]) -> Vec<f64> {
        ticks.iter().map(|t| t.value).collect()
    }

    fn labels(ticks: &[Tick]) -> Vec<&str> {
        ticks.iter().map(|t| t.label.as_str()).collect()
    }

    #[test]
    fn test_wrappers_keep_positions() {
        let sources: Vec<Box<dyn TickSource>> = vec![
            Box::new(ReadableDuration::new(LogTicks)),
            Box::new(ReadableBytes::new(LogTicks)),
            Box::new(ReadableTime::new(LogTicks, Duration::from_secs(1))),
            Units::Unitless.wrap(Box::new(LogTicks)),
        ];
        for (min, max) in [(1.0, 1e6), (0.5, 3.0), (1e-3, 1e12)] {
            let base = LogTicks.ticks(min, max);
            for source in &sources {
                let wrapped = source.ticks(min, max);
                assert_eq!(wrapped.len(), base.len());
                assert_eq!(positions(&wrapped), positions(&base));
            }
        }
    }

    #[test]
    fn test_wrapper_passes_bounds_through() {
        let linear = LinearTicks::default();
        let wrapped = ReadableBytes::new(linear);
        assert_eq!(
            positions(&wrapped.ticks(0.0, 4096.0)),
            positions(&linear.ticks(0.0, 4096.0))
        );
    }

    #[test]
    fn test_duration_label() {
        let source = ReadableDuration::new(Fixed(vec![Tick::major(90_000_000_000.0, "9e10")]));
        let ticks = source.ticks(0.0, 1.0);
        assert_eq!(labels(&ticks), vec!["1m30s"]);
        assert_eq!(ticks[0].value, 90_000_000_000.0);
    }

    #[test]
    fn test_bytes_label() {
        let source = ReadableBytes::new(Fixed(vec![
            Tick::major(1024.0, "1024"),
            Tick::major(-5.0, "-5"),
        ]));
        assert_eq!(labels(&source.ticks(0.0, 1.0)), vec!["1.0 KiB", "0 B"]);
    }

    #[test]
    fn test_time_label_epoch() {
        let source = ReadableTime::new(Fixed(vec![Tick::major(0.0, "0")]), Duration::from_secs(1));
        assert_eq!(labels(&source.ticks(0.0, 1.0)), vec!["1970-01-01T00:00:00Z"]);
    }

    #[test]
    fn test_time_label_truncates() {
        assert_eq!(format_time(1_000.9, Duration::from_secs(1)), "1970-01-01T00:16:40Z");
        assert_eq!(format_time(119.0, Duration::from_secs(60)), "1970-01-01T00:01:00Z");
        assert_eq!(format_time(-1.0, Duration::from_secs(60)), "1969-12-31T23:59:00Z");
    }

    #[test]
    fn test_time_label_truncates_on_millis() {
        let step = Duration::from_millis(1_500);
        assert_eq!(format_time(2.0, step), "1970-01-01T00:00:01.500Z");
        assert_eq!(format_time(3.9, step), "1970-01-01T00:00:03Z");
        assert_eq!(format_time(2.0, Duration::from_secs(1)), "1970-01-01T00:00:02Z");
    }

    #[test]
    fn test_time_label_out_of_range() {
        assert_eq!(format_time(1e300, Duration::from_secs(1)), 1e300f64.to_string());
        assert_eq!(format_time(f64::NAN, Duration::from_secs(1)), "NaN");
    }

    #[test]
    fn test_minor_ticks_relabeled_and_kept_minor() {
        let source = ReadableBytes::new(Fixed(vec![Tick::minor(2048.0), Tick::major(1024.0, "x")]));
        let ticks = source.ticks(0.0, 1.0);
        assert!(ticks[0].is_minor());
        assert_eq!(ticks[0].label, "2.0 KiB");
        assert!(!ticks[1].is_minor());
        assert_eq!(ticks[1].label, "1.0 KiB");
    }

    #[test]
    fn test_wrappers_are_stateless() {
        let source = ReadableDuration::new(LinearTicks::default());
        let first = source.ticks(0.0, 1e10);
        let _ = source.ticks(5.0, 6.0);
        assert_eq!(source.ticks(0.0, 1e10), first);
    }

    #[test]
    fn test_log_ticks_decades() {
        let ticks = LogTicks.ticks(1.0, 1000.0);
        let majors: Vec<f64> = ticks.iter().filter(|t| !t.is_minor()).map(|t| t.value).collect();
        assert_eq!(majors, vec![1.0, 10.0, 100.0, 1000.0]);
        assert_eq!(ticks.iter().filter(|t| t.is_minor()).count(), 3 * 8);
        assert_eq!(ticks[0].label, "1.0");
        assert_eq!(ticks[1], Tick::minor(2.0));
    }

    #[test]
    fn test_log_ticks_follow_plotters() {
        let coord: LogCoord<f64> = (1.0..1e6).log_scale().into();
        let ticks = LogTicks.ticks(1.0, 1e6);
        let majors: Vec<f64> = ticks.iter().filter(|t| !t.is_minor()).map(|t| t.value).collect();
        assert_eq!(majors, coord.key_points(BoldPoints(LABELS)));
        assert!(ticks.windows(2).all(|w| w[0].value < w[1].value));
        assert!(ticks.iter().filter(|t| t.is_minor()).all(|t| t.label.is_empty()));
    }

    #[test]
    fn test_log_ticks_clamp_nonpositive() {
        assert!(LogTicks.ticks(-1.0, -0.5).is_empty());
        assert!(!LogTicks.ticks(0.0, 10.0).is_empty());
        assert_eq!(LogTicks.ticks(-5.0, 10.0), LogTicks.ticks(0.0, 10.0));
    }

    #[test]
    fn test_linear_ticks_nice_steps() {
        let ticks = LinearTicks { target: 5 }.ticks(0.0, 10.0);
        let majors: Vec<&str> = ticks.iter().filter(|t| !t.is_minor()).map(|t| t.label.as_str()).collect();
        assert_eq!(majors, vec!["0.0", "5.0", "10.0"]);
        assert!(ticks.windows(2).all(|w| w[0].value < w[1].value));
        assert!(ticks.contains(&Tick::minor(2.5)));
    }

    #[test]
    fn test_linear_ticks_follow_plotters() {
        let coord = RangedCoordf64::from(-3.0..47.0);
        let ticks = LinearTicks::default().ticks(-3.0, 47.0);
        let majors: Vec<f64> = ticks.iter().filter(|t| !t.is_minor()).map(|t| t.value).collect();
        assert_eq!(majors, coord.key_points(BoldPoints(LABELS)));
        assert!(ticks.iter().any(|t| t.is_minor()));
    }

    #[test]
    fn test_linear_ticks_fractional_labels() {
        let ticks = LinearTicks { target: 4 }.ticks(0.0, 1.0);
        let majors: Vec<&str> = ticks.iter().filter(|t| !t.is_minor()).map(|t| t.label.as_str()).collect();
        assert_eq!(majors, vec!["0.0", "0.5", "1.0"]);
    }

    #[test]
    fn test_linear_ticks_degenerate_ranges() {
        assert_eq!(LinearTicks::default().ticks(5.0, 5.0).len(), 1);
        assert!(LinearTicks::default().ticks(5.0, 1.0).is_empty());
        assert!(LinearTicks::default().ticks(f64::NAN, 1.0).is_empty());
        assert!(LinearTicks::default().ticks(-f64::MAX, f64::MAX).is_empty());
    }

    #[test]
    fn test_units_from_name() {
        assert_eq!(Units::from_name("duration"), Some(Units::Duration));
        assert_eq!(Units::from_name("bytes"), Some(Units::Bytes));
        assert_eq!(Units::from_name("unitless"), Some(Units::Unitless));
        assert_eq!(Units::from_name("furlongs"), None);
    }

    #[test]
    fn test_units_wrap_labels() {
        let ticks = Units::Bytes.wrap(Box::new(LogTicks)).ticks(1000.0, 2000.0);
        assert_eq!(labels(&ticks), vec!["1000 B", "2.0 KiB"]);

        let ticks = Units::Unitless.wrap(Box::new(LogTicks)).ticks(1000.0, 2000.0);
        assert_eq!(ticks, LogTicks.ticks(1000.0, 2000.0));
    }
}
