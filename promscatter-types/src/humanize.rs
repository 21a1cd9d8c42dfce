//! Human-readable durations and byte sizes.

use core::fmt;
use core::time::Duration;

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Binary size suffixes, one per power of 1024.
const BYTE_UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDurationError {
    input: String,
}

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown duration format: {:?}", self.input)
    }
}

impl std::error::Error for ParseDurationError {}

/// Parse duration strings like "2h", "1h30m", "29.99s", "988.82ms", "16.958µs", "0".
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    let input = s.trim();
    let err = || ParseDurationError {
        input: input.to_string(),
    };

    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err(err());
    }

    let mut rest = input;
    let mut nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(err)?;
        let value: f64 = rest[..number_len].parse().map_err(|_| err())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let (_, multiplier) = UNITS
            .iter()
            .find(|(suffix, _)| *suffix == &rest[..unit_len])
            .ok_or_else(err)?;
        nanos += value * multiplier;
        rest = &rest[unit_len..];
    }

    Ok(Duration::from_nanos(nanos as u64))
}

/// Format a duration in compact form, e.g. "1m30s", "2h0m0s", "1.5µs".
pub fn format_duration(d: Duration) -> String {
    format_nanos(false, d.as_nanos())
}

/// Format a signed nanosecond count in compact form. Negative values get a
/// leading `-`.
pub fn format_duration_nanos(nanos: i64) -> String {
    format_nanos(nanos < 0, nanos.unsigned_abs() as u128)
}

fn format_nanos(negative: bool, nanos: u128) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }

    let body = if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{}µs", with_fraction(nanos, 1_000))
    } else if nanos < 1_000_000_000 {
        format!("{}ms", with_fraction(nanos, 1_000_000))
    } else {
        let hours = nanos / 3_600_000_000_000;
        let minutes = nanos / 60_000_000_000 % 60;
        let seconds = with_fraction(nanos % 60_000_000_000, 1_000_000_000);
        if hours > 0 {
            format!("{}h{}m{}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m{}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

// `value / scale` printed with the fraction's trailing zeros removed.
fn with_fraction(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = scale.ilog10() as usize;
    let fraction = format!("{:0width$}", fraction, width = digits);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Format a byte count with binary prefixes, e.g. "512 B", "1.0 KiB", "10 KiB".
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut exponent = 0;
    let mut divisor = 1u64;
    while bytes / divisor >= 1024 && exponent + 1 < BYTE_UNITS.len() {
        divisor *= 1024;
        exponent += 1;
    }

    let value = ((bytes as f64 / divisor as f64) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{:.1} {}", value, BYTE_UNITS[exponent])
    } else {
        format!("{:.0} {}", value, BYTE_UNITS[exponent])
    }
}

/// Format a floating point byte magnitude. Negative and NaN inputs clamp to
/// zero; values beyond `u64::MAX` saturate.
pub fn format_bytes_f64(bytes: f64) -> String {
    let clamped = if bytes.is_nan() || bytes < 0.0 { 0.0 } else { bytes };
    format_bytes(clamped as u64)
}
