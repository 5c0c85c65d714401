//! Shared API types
//!
//! Error responses use the body `{"error", "code", "message"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::BackendError;
use crate::domain::ViewError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::BadGateway {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn view_not_found(view_id: &str) -> Self {
        Self::not_found("VIEW_NOT_FOUND", format!("View not found: {}", view_id))
    }

    pub fn from_backend(e: BackendError) -> Self {
        match e {
            BackendError::NotFound(trace_id) => {
                Self::not_found("TRACE_NOT_FOUND", format!("Trace not found: {}", trace_id))
            }
            BackendError::InvalidRange { .. } => Self::bad_request("INVALID_TIME_RANGE", e.to_string()),
            BackendError::Config(_) => {
                tracing::error!(error = %e, "Backend misconfigured");
                Self::internal("Tracing backend is misconfigured")
            }
            _ => {
                tracing::warn!(error = %e, transient = e.is_transient(), "Tracing backend error");
                Self::bad_gateway(e.to_string())
            }
        }
    }

    pub fn from_view(e: ViewError) -> Self {
        match e {
            ViewError::Backend(e) => Self::from_backend(e),
            ViewError::Superseded(_) => Self::conflict("LOAD_SUPERSEDED", e.to_string()),
            ViewError::NotLoaded => Self::conflict(
                "TRACE_NOT_LOADED",
                "No trace loaded in this view; POST a trace_id to /trace first",
            ),
            ViewError::SpanNotFound(_) => Self::not_found("SPAN_NOT_FOUND", e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, "conflict", code, message),
            Self::BadGateway { message } => (
                StatusCode::BAD_GATEWAY,
                "bad_gateway",
                "BACKEND_ERROR".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
