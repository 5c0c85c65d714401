//! Zipkin-compatible HTTP backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::backend::{TimestampUnit, TraceBackend, TraceQuery};
use super::error::BackendError;
use super::wire::decode_spans;
use crate::core::constants::{APP_NAME_LOWER, CURRENT_VERSION, TRACE_ID_PLACEHOLDER};
use crate::domain::traces::SpanRecord;

/// Maximum error body length kept in `BackendError::Status`
const MAX_ERROR_BODY: usize = 512;

/// Fetches traces with `GET {base_url}{trace_path}`
pub struct ZipkinBackend {
    client: reqwest::Client,
    base_url: Url,
    trace_path: String,
    unit: TimestampUnit,
}

impl ZipkinBackend {
    pub fn new(
        base_url: &str,
        trace_path: &str,
        timeout: Duration,
        unit: TimestampUnit,
    ) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::Config(format!("invalid backend url '{base_url}': {e}")))?;
        if !trace_path.contains(TRACE_ID_PLACEHOLDER) {
            return Err(BackendError::Config(format!(
                "trace_path must contain {TRACE_ID_PLACEHOLDER}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", APP_NAME_LOWER, CURRENT_VERSION))
            .build()?;

        Ok(Self {
            client,
            base_url,
            trace_path: trace_path.to_string(),
            unit,
        })
    }

    /// Full request url for a query
    fn trace_url(&self, query: &TraceQuery) -> Result<Url, BackendError> {
        let path = self
            .trace_path
            .replace(TRACE_ID_PLACEHOLDER, &urlencoding::encode(&query.trace_id));
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&joined)
            .map_err(|e| BackendError::Config(format!("invalid trace url '{joined}': {e}")))?;

        if !query.range.is_unbounded() {
            let mut pairs = url.query_pairs_mut();
            if let Some(from) = query.range.from_ms {
                pairs.append_pair("from", &from.to_string());
            }
            if let Some(to) = query.range.to_ms {
                pairs.append_pair("to", &to.to_string());
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl TraceBackend for ZipkinBackend {
    async fn fetch_spans(&self, query: &TraceQuery) -> Result<Vec<SpanRecord>, BackendError> {
        let url = self.trace_url(query)?;
        tracing::debug!(trace_id = %query.trace_id, %url, "Fetching trace");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(query.trace_id.clone()));
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(BackendError::Status {
                backend: self.name(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let spans = decode_spans(&bytes, self.unit)?;
        tracing::debug!(
            trace_id = %query.trace_id,
            span_count = spans.len(),
            "Fetched trace"
        );
        Ok(spans)
    }

    fn name(&self) -> &'static str {
        "zipkin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::backend::TimeRange;
    use httpmock::prelude::*;

    const PATH: &str = "/api/v2/trace/{trace_id}";

    fn backend(server: &MockServer) -> ZipkinBackend {
        ZipkinBackend::new(
            &server.base_url(),
            PATH,
            Duration::from_secs(5),
            TimestampUnit::Micros,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let result = ZipkinBackend::new("not a url", PATH, Duration::from_secs(1), TimestampUnit::Micros);
        assert!(matches!(result, Err(BackendError::Config(_))));
    }

    #[test]
    fn test_new_requires_placeholder() {
        let result = ZipkinBackend::new(
            "http://localhost:9411",
            "/api/v2/trace",
            Duration::from_secs(1),
            TimestampUnit::Micros,
        );
        assert!(matches!(result, Err(BackendError::Config(_))));
    }

    #[test]
    fn test_trace_url_with_range() {
        let backend = ZipkinBackend::new(
            "http://localhost:9411/",
            PATH,
            Duration::from_secs(1),
            TimestampUnit::Micros,
        )
        .unwrap();
        let query = TraceQuery::new("abc", TimeRange::new(Some(1), Some(2)).unwrap());
        assert_eq!(
            backend.trace_url(&query).unwrap().as_str(),
            "http://localhost:9411/api/v2/trace/abc?from=1&to=2"
        );
    }

    #[test]
    fn test_trace_url_encodes_id() {
        let backend = ZipkinBackend::new(
            "http://localhost:9411",
            PATH,
            Duration::from_secs(1),
            TimestampUnit::Micros,
        )
        .unwrap();
        let query = TraceQuery::new("a/b c", TimeRange::default());
        assert_eq!(
            backend.trace_url(&query).unwrap().as_str(),
            "http://localhost:9411/api/v2/trace/a%2Fb%20c"
        );
    }

    #[tokio::test]
    async fn test_fetch_spans() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v2/trace/t1")
                    .query_param("from", "100");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"[[{"traceId":"t1","id":"a","name":"root","timestamp":10,"duration":5,
                              "localEndpoint":{"serviceName":"api"}}]]"#,
                    );
            })
            .await;

        let query = TraceQuery::new("t1", TimeRange::new(Some(100), None).unwrap());
        let spans = backend(&server).fetch_spans(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].service_name, "api");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/trace/missing");
                then.status(404);
            })
            .await;

        let query = TraceQuery::new("missing", TimeRange::default());
        let err = backend(&server).fetch_spans(&query).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/trace/t1");
                then.status(500).body("boom");
            })
            .await;

        let query = TraceQuery::new("t1", TimeRange::default());
        let err = backend(&server).fetch_spans(&query).await.unwrap_err();
        match err {
            BackendError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/trace/t1");
                then.status(200).body("not json");
            })
            .await;

        let query = TraceQuery::new("t1", TimeRange::default());
        let err = backend(&server).fetch_spans(&query).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
