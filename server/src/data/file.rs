//! Directory-backed trace source
//!
//! Reads `{dir}/{trace_id}.json`, in any body shape `wire` understands.
//! Useful for offline inspection of exported traces.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use super::backend::{TimestampUnit, TraceBackend, TraceQuery};
use super::error::BackendError;
use super::wire::decode_spans;
use crate::domain::traces::SpanRecord;

pub struct FileBackend {
    dir: PathBuf,
    unit: TimestampUnit,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>, unit: TimestampUnit) -> Self {
        Self {
            dir: dir.into(),
            unit,
        }
    }

    fn trace_path(&self, trace_id: &str) -> Result<PathBuf, BackendError> {
        let valid = !trace_id.is_empty()
            && trace_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            // Anything else could escape the directory
            return Err(BackendError::NotFound(trace_id.to_string()));
        }
        Ok(self.dir.join(format!("{trace_id}.json")))
    }
}

#[async_trait]
impl TraceBackend for FileBackend {
    async fn fetch_spans(&self, query: &TraceQuery) -> Result<Vec<SpanRecord>, BackendError> {
        let path = self.trace_path(&query.trace_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BackendError::NotFound(query.trace_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut spans = decode_spans(&bytes, self.unit)?;
        let total = spans.len();
        if !query.range.is_unbounded() {
            spans.retain(|span| query.range.contains_micros(span.start_timestamp));
        }

        tracing::debug!(
            trace_id = %query.trace_id,
            path = %path.display(),
            span_count = spans.len(),
            filtered = total - spans.len(),
            "Loaded trace from file"
        );
        Ok(spans)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
