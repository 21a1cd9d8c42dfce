//! Flatten matrix results into scatter points.

use promscatter_types::Series;

/// One plotted point: X in integer Unix seconds, Y the floored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Flatten every sample of every series into one point set.
///
/// X is the sample timestamp truncated to whole seconds. Y is the sample
/// value raised to at least `floor`; NaN values are floored too. Sample
/// order within and across series is preserved.
pub fn flatten(series: &[Series], floor: f64) -> Vec<Point> {
    let mut points = Vec::with_capacity(count_points(series));
    for s in series {
        points.extend(
            s.values
                .iter()
                .map(|sample| Point::new(sample.unix_seconds() as f64, sample.value.max(floor))),
        );
    }
    points
}

/// Total number of samples across a matrix.
pub fn count_points(series: &[Series]) -> usize {
    series.iter().map(Series::len).sum()
}
