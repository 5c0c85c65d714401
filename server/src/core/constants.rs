// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "TraceLens";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tracelens";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tracelens";

/// Crate version
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tracelens.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TRACELENS_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_DEBUG: &str = "TRACELENS_DEBUG";
pub const ENV_HOST: &str = "TRACELENS_HOST";
pub const ENV_PORT: &str = "TRACELENS_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TRACELENS_LOG";

pub const ENV_BACKEND: &str = "TRACELENS_BACKEND";
pub const ENV_BACKEND_URL: &str = "TRACELENS_BACKEND_URL";
pub const ENV_BACKEND_DIR: &str = "TRACELENS_BACKEND_DIR";
pub const ENV_TIMESTAMP_UNIT: &str = "TRACELENS_TIMESTAMP_UNIT";

// =============================================================================
// Server Defaults
// =============================================================================

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5390;

/// Graceful shutdown timeout for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Tracing Backend Defaults
// =============================================================================

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:9411";

/// Placeholder substituted with the trace id in `backend.trace_path`
pub const TRACE_ID_PLACEHOLDER: &str = "{trace_id}";

pub const DEFAULT_TRACE_PATH: &str = "/api/v2/trace/{trace_id}";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// View Sessions
// =============================================================================

pub const DEFAULT_MAX_VIEWS: u64 = 256;
pub const DEFAULT_VIEW_IDLE_MINUTES: u64 = 30;

/// How often expired views are flushed
pub const VIEW_MAINTENANCE_INTERVAL_SECS: u64 = 60;

/// Maximum length of trace, span and view ids accepted by the API
pub const MAX_ID_LENGTH: u64 = 256;
