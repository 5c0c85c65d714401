//! Wire decoding of span lists
//!
//! Accepts the span shapes tracing backends emit in practice:
//!
//! | Shape      | Ids                              | Service                       | Operation        |
//! |------------|----------------------------------|-------------------------------|------------------|
//! | Zipkin v2  | `id`, `traceId`, `parentId`      | `localEndpoint.serviceName`   | `name`           |
//! | Snake case | `id`, `trace_id`, `parent_id`    | `local_endpoint.serviceName`  | `name`           |
//! | Flattened  | `id`, `trace_id`                 | `service_name` / `service`    | `operation_name` |
//!
//! The body may be a flat array of spans or an array of traces.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::backend::TimestampUnit;
use super::error::BackendError;
use crate::domain::traces::{Annotation, SpanRecord};

/// Service name used when a span carries none
pub const UNKNOWN_SERVICE: &str = "unknown";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Traces(Vec<Vec<WireSpan>>),
    Spans(Vec<WireSpan>),
}

#[derive(Debug, Default, Deserialize)]
struct WireEndpoint {
    #[serde(default, alias = "service_name")]
    #[serde(rename = "serviceName")]
    service_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireError {
    Flag(bool),
    Message(String),
}

#[derive(Debug, Deserialize)]
struct WireAnnotation {
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct WireSpan {
    #[serde(alias = "span_id", alias = "spanId")]
    id: String,
    #[serde(default, alias = "traceId")]
    trace_id: Option<String>,
    #[serde(default, alias = "parentId")]
    parent_id: Option<String>,
    #[serde(default, alias = "operation_name", alias = "operationName", alias = "operation")]
    name: Option<String>,
    #[serde(default, alias = "localEndpoint")]
    local_endpoint: Option<WireEndpoint>,
    #[serde(default, alias = "serviceName", alias = "service")]
    service_name: Option<String>,
    #[serde(default, alias = "start_time", alias = "startTime")]
    timestamp: Option<i64>,
    #[serde(default)]
    duration: Option<i64>,
    #[serde(default)]
    error: Option<WireError>,
    #[serde(default)]
    tags: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    annotations: Option<Vec<WireAnnotation>>,
}

/// Decode a response body into span records with timestamps in microseconds
pub fn decode_spans(body: &[u8], unit: TimestampUnit) -> Result<Vec<SpanRecord>, BackendError> {
    let response: WireResponse = serde_json::from_slice(body)?;
    let spans: Vec<WireSpan> = match response {
        WireResponse::Traces(traces) => traces.into_iter().flatten().collect(),
        WireResponse::Spans(spans) => spans,
    };
    Ok(spans.into_iter().map(|span| span.into_record(unit)).collect())
}

impl WireSpan {
    fn into_record(self, unit: TimestampUnit) -> SpanRecord {
        let tags: BTreeMap<String, String> = self
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();

        let is_error = match &self.error {
            Some(WireError::Flag(flag)) => *flag,
            Some(WireError::Message(message)) => !message.is_empty(),
            None => false,
        } || tags.contains_key("error")
            || tags.contains_key("error.message");

        let service_name = self
            .local_endpoint
            .and_then(|endpoint| endpoint.service_name)
            .or(self.service_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string());

        let duration = unit.to_micros(self.duration.unwrap_or(0)).max(0);

        let annotations: Vec<Annotation> = self
            .annotations
            .unwrap_or_default()
            .into_iter()
            .map(|a| Annotation {
                timestamp: unit.to_micros(a.timestamp),
                value: a.value,
            })
            .collect();

        SpanRecord {
            trace_id: self.trace_id.unwrap_or_default(),
            parent_id: self.parent_id.filter(|p| !p.is_empty()),
            operation_name: self.name.unwrap_or_default(),
            service_name,
            start_timestamp: unit.to_micros(self.timestamp.unwrap_or(0)),
            duration_micros: u64::try_from(duration).unwrap_or(0),
            is_error,
            tags,
            annotations,
            id: self.id,
        }
    }
}
