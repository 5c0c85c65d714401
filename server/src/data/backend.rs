//! Tracing backend abstraction
//!
//! A backend turns a trace id (and optional time window) into the flat list
//! of span records the hierarchy builder consumes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::BackendError;
use super::file::FileBackend;
use super::zipkin::ZipkinBackend;
use crate::core::config::{BackendConfig, BackendKind};
use crate::domain::traces::SpanRecord;

/// Source of raw spans
#[async_trait]
pub trait TraceBackend: Send + Sync {
    /// Fetch every span of one trace. Order is unspecified.
    async fn fetch_spans(&self, query: &TraceQuery) -> Result<Vec<SpanRecord>, BackendError>;

    /// Backend name for logs and errors
    fn name(&self) -> &'static str;
}

/// Optional time window in epoch milliseconds, both ends inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

impl TimeRange {
    pub fn new(from_ms: Option<i64>, to_ms: Option<i64>) -> Result<Self, BackendError> {
        if let (Some(from_ms), Some(to_ms)) = (from_ms, to_ms)
            && from_ms > to_ms
        {
            return Err(BackendError::InvalidRange { from_ms, to_ms });
        }
        Ok(Self { from_ms, to_ms })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from_ms.is_none() && self.to_ms.is_none()
    }

    /// True if a span starting at `start_micros` falls inside the window
    pub fn contains_micros(&self, start_micros: i64) -> bool {
        let start_ms = start_micros.div_euclid(1_000);
        self.from_ms.is_none_or(|from| start_ms >= from) && self.to_ms.is_none_or(|to| start_ms <= to)
    }
}

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceQuery {
    pub trace_id: String,
    pub range: TimeRange,
}

impl TraceQuery {
    pub fn new(trace_id: impl Into<String>, range: TimeRange) -> Self {
        Self {
            trace_id: trace_id.into(),
            range,
        }
    }
}

/// Unit of the timestamps and durations the backend emits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Micros,
    Millis,
    Nanos,
}

impl TimestampUnit {
    /// Convert a raw value in this unit to microseconds (saturating)
    pub fn to_micros(self, value: i64) -> i64 {
        match self {
            Self::Micros => value,
            Self::Millis => value.saturating_mul(1_000),
            Self::Nanos => value / 1_000,
        }
    }
}

impl FromStr for TimestampUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "micros" | "us" => Ok(Self::Micros),
            "millis" | "ms" => Ok(Self::Millis),
            "nanos" | "ns" => Ok(Self::Nanos),
            other => Err(format!(
                "unknown timestamp unit '{other}' (expected micros, millis, nanos)"
            )),
        }
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Micros => "micros",
            Self::Millis => "millis",
            Self::Nanos => "nanos",
        })
    }
}

/// Build the configured backend
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn TraceBackend>, BackendError> {
    let backend: Arc<dyn TraceBackend> = match config.kind {
        BackendKind::Zipkin => Arc::new(ZipkinBackend::new(
            &config.url,
            &config.trace_path,
            Duration::from_secs(config.timeout_secs),
            config.timestamp_unit,
        )?),
        BackendKind::File => {
            let dir = config.dir.clone().ok_or_else(|| {
                BackendError::Config("backend.dir is required for the file backend".to_string())
            })?;
            Arc::new(FileBackend::new(dir, config.timestamp_unit))
        }
    };
    tracing::debug!(backend = backend.name(), "Tracing backend initialized");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_rejects_inverted() {
        assert!(TimeRange::new(Some(10), Some(5)).is_err());
        assert!(TimeRange::new(Some(5), Some(5)).is_ok());
        assert!(TimeRange::new(None, Some(5)).is_ok());
    }

    #[test]
    fn test_time_range_contains() {
        let range = TimeRange::new(Some(10), Some(20)).unwrap();
        assert!(range.contains_micros(10_000));
        assert!(range.contains_micros(20_999));
        assert!(!range.contains_micros(9_999));
        assert!(!range.contains_micros(21_000));
        assert!(TimeRange::default().contains_micros(i64::MIN));
    }

    #[test]
    fn test_timestamp_unit_conversion() {
        assert_eq!(TimestampUnit::Micros.to_micros(1_500), 1_500);
        assert_eq!(TimestampUnit::Millis.to_micros(1_500), 1_500_000);
        assert_eq!(TimestampUnit::Nanos.to_micros(1_500), 1);
        assert_eq!(TimestampUnit::Millis.to_micros(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_timestamp_unit_parse() {
        assert_eq!("ms".parse::<TimestampUnit>().unwrap(), TimestampUnit::Millis);
        assert_eq!("NANOS".parse::<TimestampUnit>().unwrap(), TimestampUnit::Nanos);
        assert!("days".parse::<TimestampUnit>().is_err());
    }

    #[test]
    fn test_create_file_backend_requires_dir() {
        let config = BackendConfig {
            kind: BackendKind::File,
            dir: None,
            ..Default::default()
        };
        assert!(matches!(
            create_backend(&config),
            Err(BackendError::Config(_))
        ));
    }
}
