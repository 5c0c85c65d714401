//! Trace data sources
//!
//! - `backend` - `TraceBackend` trait, query and time range types
//! - `zipkin` - HTTP client for Zipkin-compatible APIs
//! - `file` - Reads exported traces from a directory
//! - `wire` - Tolerant decoding of backend span shapes
//! - `error` - Backend error type

pub mod backend;
pub mod error;
pub mod file;
pub mod wire;
pub mod zipkin;

pub use backend::{TimeRange, TimestampUnit, TraceBackend, TraceQuery, create_backend};
pub use error::BackendError;
pub use file::FileBackend;
pub use zipkin::ZipkinBackend;
