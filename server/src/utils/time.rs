//! Time utility functions

use chrono::{DateTime, Utc};

/// Convert microseconds since Unix epoch to DateTime<Utc>
pub fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_else(|| {
        tracing::warn!(micros, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Human readable duration: `0ms`, `750μs`, `12.34ms`, `1.50s`
pub fn format_duration_micros(micros: u64) -> String {
    match micros {
        0 => "0ms".to_string(),
        1..1_000 => format!("{micros}μs"),
        1_000..1_000_000 => format!("{:.2}ms", micros as f64 / 1_000.0),
        _ => format!("{:.2}s", micros as f64 / 1_000_000.0),
    }
}

/// Wall clock time of day in UTC, `HH:MM:SS.mmm`
pub fn format_timestamp_micros(micros: i64) -> String {
    micros_to_datetime(micros).format("%H:%M:%S%.3f").to_string()
}
