//! Human-readable sizes and durations

use std::time::Duration;

use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

// Longest suffix first so "KB" wins over "B"
const UNITS: [(&str, u64); 7] = [
    ("KB", KIB),
    ("MB", MIB),
    ("GB", GIB),
    ("B", 1),
    ("K", KIB),
    ("M", MIB),
    ("G", GIB),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid size format: {0}")]
pub struct SizeParseError(pub String);

/// Parses `10M`, `1.5G`, `512KB` or a bare byte count. Suffixes are binary and case-insensitive.
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let normalized = input.trim().to_ascii_uppercase();
    let invalid = || SizeParseError(input.to_string());

    for (unit, multiplier) in UNITS {
        let Some(number) = normalized.strip_suffix(unit) else {
            continue;
        };
        let value: f64 = match number.trim().parse() {
            Ok(value) => value,
            Err(_) => continue,
        };
        let bytes = value * multiplier as f64;
        // u64::MAX as f64 rounds up to 2^64, which is already out of range
        if !bytes.is_finite() || bytes < 0.0 || bytes >= u64::MAX as f64 {
            return Err(invalid());
        }
        return Ok(bytes as u64);
    }

    normalized.parse::<u64>().map_err(|_| invalid())
}

/// Formats a byte count with one decimal, e.g. `114.4 MB`.
pub fn format_size(bytes: f64) -> String {
    let mut size = bytes;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

pub fn format_duration(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        let whole = elapsed.as_secs();
        format!("{}m {}s", whole / 60, whole % 60)
    } else {
        let whole = elapsed.as_secs();
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    }
}
