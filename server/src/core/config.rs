use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::data::TimestampUnit;
use crate::utils::path::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_BACKEND_URL,
    DEFAULT_HOST, DEFAULT_MAX_VIEWS, DEFAULT_PORT, DEFAULT_TRACE_PATH, DEFAULT_VIEW_IDLE_MINUTES,
    TRACE_ID_PLACEHOLDER,
};

// =============================================================================
// Backend Kind Enum
// =============================================================================

/// Where spans are fetched from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Zipkin,
    File,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Zipkin => write!(f, "zipkin"),
            BackendKind::File => write!(f, "file"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Tracing backend configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BackendFileConfig {
    pub kind: Option<BackendKind>,
    pub url: Option<String>,
    pub trace_path: Option<String>,
    pub timeout_secs: Option<u64>,
    pub timestamp_unit: Option<TimestampUnit>,
    pub dir: Option<String>,
}

/// View session configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ViewsFileConfig {
    pub max_views: Option<u64>,
    pub idle_minutes: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub backend: Option<BackendFileConfig>,
    pub views: Option<ViewsFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `$current.$field` when `$incoming.$field` is set
macro_rules! merge_fields {
    ($section:literal, $current:expr, $incoming:expr, $($field:ident),+ $(,)?) => {
        $(
            if $incoming.$field.is_some() {
                tracing::trace!(
                    section = $section,
                    field = stringify!($field),
                    value = ?$incoming.$field,
                    "Merging config field"
                );
                $current.$field = $incoming.$field;
            }
        )+
    };
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of top-level keys this config does not understand
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn warn_unknown_fields(&self) {
        let unknown = self.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(
                fields = %unknown.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            merge_fields!("server", current, server, host, port);
        }

        if let Some(backend) = other.backend {
            let current = self.backend.get_or_insert_with(BackendFileConfig::default);
            merge_fields!(
                "backend",
                current,
                backend,
                kind,
                url,
                trace_path,
                timeout_secs,
                timestamp_unit,
                dir,
            );
        }

        if let Some(views) = other.views {
            let current = self.views.get_or_insert_with(ViewsFileConfig::default);
            merge_fields!("views", current, views, max_views, idle_minutes);
        }

        if other.debug.is_some() {
            tracing::trace!(debug = ?other.debug, "Merging debug");
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    pub trace_path: String,
    pub timeout_secs: u64,
    pub timestamp_unit: TimestampUnit,
    pub dir: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: DEFAULT_BACKEND_URL.to_string(),
            trace_path: DEFAULT_TRACE_PATH.to_string(),
            timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            timestamp_unit: TimestampUnit::default(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewsConfig {
    pub max_views: u64,
    pub idle_minutes: u64,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            max_views: DEFAULT_MAX_VIEWS,
            idle_minutes: DEFAULT_VIEW_IDLE_MINUTES,
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub views: ViewsConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.tracelens/tracelens.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(file_config, cli);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            backend = %config.backend.kind,
            debug = config.debug,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer defaults, merged file config and CLI/env overrides
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_backend = file_config.backend.unwrap_or_default();
        let file_views = file_config.views.unwrap_or_default();
        let backend_defaults = BackendConfig::default();
        let views_defaults = ViewsConfig::default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let backend = BackendConfig {
            kind: cli
                .backend
                .or(file_backend.kind)
                .unwrap_or(backend_defaults.kind),
            url: cli
                .backend_url
                .clone()
                .or(file_backend.url)
                .unwrap_or(backend_defaults.url),
            trace_path: file_backend
                .trace_path
                .unwrap_or(backend_defaults.trace_path),
            timeout_secs: file_backend
                .timeout_secs
                .unwrap_or(backend_defaults.timeout_secs),
            timestamp_unit: cli
                .timestamp_unit
                .or(file_backend.timestamp_unit)
                .unwrap_or(backend_defaults.timestamp_unit),
            dir: cli
                .backend_dir
                .clone()
                .or_else(|| file_backend.dir.map(|d| expand_path(&d))),
        };

        let views = ViewsConfig {
            max_views: file_views.max_views.unwrap_or(views_defaults.max_views),
            idle_minutes: file_views
                .idle_minutes
                .unwrap_or(views_defaults.idle_minutes),
        };

        // debug: CLI/env flag takes precedence, then file config, default false
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        Self {
            server,
            backend,
            views,
            debug,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        match self.backend.kind {
            BackendKind::Zipkin => {
                Url::parse(&self.backend.url).with_context(|| {
                    format!(
                        "Configuration error: backend.url '{}' is not a valid URL",
                        self.backend.url
                    )
                })?;
                if !self.backend.trace_path.contains(TRACE_ID_PLACEHOLDER) {
                    anyhow::bail!(
                        "Configuration error: backend.trace_path must contain {}",
                        TRACE_ID_PLACEHOLDER
                    );
                }
            }
            BackendKind::File => {
                if self.backend.dir.is_none() {
                    anyhow::bail!(
                        "Configuration error: backend.dir is required when backend.kind is 'file'"
                    );
                }
            }
        }

        if self.backend.timeout_secs == 0 {
            anyhow::bail!("Configuration error: backend.timeout_secs must be greater than 0");
        }
        if self.views.max_views == 0 {
            anyhow::bail!("Configuration error: views.max_views must be greater than 0");
        }
        if self.views.idle_minutes == 0 {
            anyhow::bail!("Configuration error: views.idle_minutes must be greater than 0");
        }

        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Server binds to all interfaces and has no authentication"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.tracelens/tracelens.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_json(json: &str, cli: &CliConfig) -> AppConfig {
        let file_config: FileConfig = serde_json::from_str(json).unwrap();
        AppConfig::resolve(file_config, cli)
    }

    #[test]
    fn test_backend_kind_serde() {
        let kind: BackendKind = serde_json::from_str(r#""file""#).unwrap();
        assert_eq!(kind, BackendKind::File);
        assert_eq!(BackendKind::Zipkin.to_string(), "zipkin");
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080 },
            "backend": {
                "kind": "zipkin",
                "url": "http://zipkin:9411",
                "timeout_secs": 3,
                "timestamp_unit": "millis"
            },
            "views": { "max_views": 10, "idle_minutes": 5 },
            "debug": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let backend = config.backend.as_ref().unwrap();
        assert_eq!(backend.url.as_deref(), Some("http://zipkin:9411"));
        assert_eq!(backend.timestamp_unit, Some(TimestampUnit::Millis));
        assert_eq!(config.views.as_ref().unwrap().max_views, Some(10));
        assert_eq!(config.debug, Some(true));
        assert!(config.unknown_fields().is_empty());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "bakend": {} }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.unknown_fields(), vec!["bakend"]);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{ "server": { "host": "127.0.0.1", "port": 1000 }, "backend": { "url": "http://a" } }"#,
        )
        .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "server": { "port": 2000 }, "debug": true }"#).unwrap();

        base.merge(overlay);

        let server = base.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(2000));
        assert_eq!(base.backend.as_ref().unwrap().url.as_deref(), Some("http://a"));
        assert_eq!(base.debug, Some(true));
    }

    #[test]
    fn test_defaults() {
        let config = resolve_json("{}", &CliConfig::default());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.backend.kind, BackendKind::Zipkin);
        assert_eq!(config.backend.url, DEFAULT_BACKEND_URL);
        assert_eq!(config.backend.trace_path, DEFAULT_TRACE_PATH);
        assert_eq!(config.views.max_views, DEFAULT_MAX_VIEWS);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = CliConfig {
            port: Some(9999),
            backend_url: Some("http://cli:9411".to_string()),
            timestamp_unit: Some(TimestampUnit::Nanos),
            ..Default::default()
        };
        let config = resolve_json(
            r#"{ "server": { "port": 1234 }, "backend": { "url": "http://file:9411", "timestamp_unit": "millis" } }"#,
            &cli,
        );
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.backend.url, "http://cli:9411");
        assert_eq!(config.backend.timestamp_unit, TimestampUnit::Nanos);
    }

    #[test]
    fn test_validate_file_backend_requires_dir() {
        let config = resolve_json(r#"{ "backend": { "kind": "file" } }"#, &CliConfig::default());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend.dir"));

        let config = resolve_json(
            r#"{ "backend": { "kind": "file", "dir": "/var/traces" } }"#,
            &CliConfig::default(),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_trace_path_placeholder() {
        let config = resolve_json(
            r#"{ "backend": { "trace_path": "/api/v2/trace" } }"#,
            &CliConfig::default(),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_url() {
        let config = resolve_json(r#"{ "backend": { "url": "not a url" } }"#, &CliConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_port() {
        let cli = CliConfig {
            port: Some(0),
            ..Default::default()
        };
        let config = resolve_json("{}", &cli);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{ "server": { "port": 6001 } }"#).unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 6001);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/definitely/not/here.json")),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }
}
