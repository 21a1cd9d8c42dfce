//! Rolling throughput sparkline.
//!
//! A [`StreamTap`] accumulates byte counts into fixed-length time buckets and
//! redraws a one-line sparkline on a diagnostic writer whenever a bucket
//! closes. Memory is bounded by the window width; the payload bytes are never
//! retained.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use promscatter_types::format_bytes;

/// Maximum number of buckets kept in the window.
pub const DEFAULT_WIDTH: usize = 60;

/// Length of one bucket.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Live, bounded view over a byte stream in progress.
#[derive(Debug)]
pub struct StreamTap<W: Write> {
    out: W,
    width: usize,
    interval: Duration,
    buckets: VecDeque<u64>,
    current: u64,
    total: u64,
    started: Instant,
    bucket_started: Instant,
}

impl<W: Write> StreamTap<W> {
    /// Create a tap with the default window.
    pub fn new(out: W) -> Self {
        Self::with_window(out, DEFAULT_WIDTH, DEFAULT_INTERVAL)
    }

    /// Create a tap keeping `width` buckets of `interval` each.
    pub fn with_window(out: W, width: usize, interval: Duration) -> Self {
        let now = Instant::now();
        let width = width.max(1);
        Self {
            out,
            width,
            interval,
            buckets: VecDeque::with_capacity(width),
            current: 0,
            total: 0,
            started: now,
            bucket_started: now,
        }
    }

    /// Record `bytes` freshly read from the stream.
    ///
    /// Redraws at most once per interval, so the cost per call is bounded by
    /// the window width.
    pub fn observe(&mut self, bytes: usize) {
        self.current += bytes as u64;
        self.total += bytes as u64;

        let now = Instant::now();
        if now.duration_since(self.bucket_started) >= self.interval {
            self.rotate();
            self.bucket_started = now;
            self.render();
        }
    }

    /// Total bytes observed so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Closed buckets currently in the window, oldest first.
    pub fn buckets(&self) -> &VecDeque<u64> {
        &self.buckets
    }

    /// Flush the pending bucket, draw the final line and end it.
    pub fn finish(mut self) -> io::Result<()> {
        if self.current > 0 {
            self.rotate();
        }
        self.render();
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Render the current window as sparkline bars.
    pub fn sparkline(&self) -> String {
        normalize_sparkline(&self.buckets)
            .into_iter()
            .map(|level| BARS[level as usize])
            .collect()
    }

    fn rotate(&mut self) {
        self.buckets.push_back(self.current);
        if self.buckets.len() > self.width {
            self.buckets.pop_front();
        }
        self.current = 0;
    }

    fn render(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            (self.total as f64 / elapsed) as u64
        } else {
            self.total
        };
        let line = format!(
            "\r{} {} ({}/s)",
            self.sparkline(),
            format_bytes(self.total),
            format_bytes(rate)
        );
        // Write errors never reach the observed stream.
        let _ = self.out.write_all(line.as_bytes());
        let _ = self.out.flush();
    }
}

/// Normalize values to 0-7 range for sparkline display.
fn normalize_sparkline(values: &VecDeque<u64>) -> Vec<u8> {
    let max = values.iter().copied().max().unwrap_or(1).max(1) as f64;
    values
        .iter()
        .map(|&v| {
            let normalized = (v as f64 / max * 7.0) as u8;
            normalized.min(7)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_scales_to_max() {
        let values: VecDeque<u64> = [0, 50, 100].into_iter().collect();
        assert_eq!(normalize_sparkline(&values), vec![0, 3, 7]);
    }

    #[test]
    fn test_normalize_all_zero() {
        let values: VecDeque<u64> = [0, 0].into_iter().collect();
        assert_eq!(normalize_sparkline(&values), vec![0, 0]);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut tap = StreamTap::with_window(Vec::new(), 4, Duration::ZERO);
        for i in 0..10 {
            tap.observe(i);
        }
        assert_eq!(tap.buckets().len(), 4);
        assert_eq!(tap.buckets().iter().copied().collect::<Vec<_>>(), vec![6, 7, 8, 9]);
        assert_eq!(tap.total(), 45);
    }

    #[test]
    fn test_render_writes_bars_and_total() {
        let mut out = Vec::new();
        {
            let mut tap = StreamTap::with_window(&mut out, 8, Duration::ZERO);
            tap.observe(1024);
            tap.observe(512);
            tap.finish().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with('\r'));
        assert!(text.contains("█"));
        assert!(text.contains("1.5 KiB"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_no_redraw_inside_interval() {
        let mut out = Vec::new();
        {
            let mut tap = StreamTap::with_window(&mut out, 8, Duration::from_secs(3600));
            tap.observe(10);
            tap.observe(10);
            assert!(tap.buckets().is_empty());
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_default_window() {
        let mut out = Vec::new();
        let mut tap = StreamTap::new(&mut out);
        for _ in 0..(DEFAULT_WIDTH * 2) {
            tap.observe(1);
        }
        assert!(tap.buckets().len() <= DEFAULT_WIDTH);
        assert_eq!(tap.total(), 120);
        tap.finish().unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("120 B"));
    }

    #[test]
    fn test_finish_flushes_pending_bucket() {
        let mut out = Vec::new();
        let mut tap = StreamTap::with_window(&mut out, 8, Duration::from_secs(3600));
        tap.observe(2048);
        tap.finish().unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2.0 KiB"));
    }
}
