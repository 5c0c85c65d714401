use clap::{Parser, Subcommand, ValueEnum};

use std::path::PathBuf;

use super::config::BackendKind;
use super::constants::{
    ENV_BACKEND, ENV_BACKEND_DIR, ENV_BACKEND_URL, ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_PORT,
    ENV_TIMESTAMP_UNIT,
};
use crate::data::TimestampUnit;
use crate::domain::traces::SortKey;

#[derive(Parser)]
#[command(name = "tracelens")]
#[command(version, about = "Distributed trace timeline viewer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug logging
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Tracing backend (zipkin or file)
    #[arg(long, global = true, env = ENV_BACKEND, value_parser = parse_backend_kind)]
    pub backend: Option<BackendKind>,

    /// Base URL of the Zipkin-compatible backend
    #[arg(long, global = true, env = ENV_BACKEND_URL)]
    pub backend_url: Option<String>,

    /// Directory of exported traces (file backend)
    #[arg(long, global = true, env = ENV_BACKEND_DIR)]
    pub backend_dir: Option<PathBuf>,

    /// Unit of backend timestamps and durations (micros, millis, nanos)
    #[arg(long, global = true, env = ENV_TIMESTAMP_UNIT, value_parser = parse_timestamp_unit)]
    pub timestamp_unit: Option<TimestampUnit>,
}

/// Parse backend kind from CLI/env string
fn parse_backend_kind(s: &str) -> Result<BackendKind, String> {
    match s.to_lowercase().as_str() {
        "zipkin" => Ok(BackendKind::Zipkin),
        "file" => Ok(BackendKind::File),
        _ => Err(format!(
            "Invalid backend '{}'. Valid options: zipkin, file",
            s
        )),
    }
}

fn parse_timestamp_unit(s: &str) -> Result<TimestampUnit, String> {
    s.parse()
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    s.parse()
}

/// Projection rendered by `show`
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShowMode {
    /// Waterfall of visible spans
    #[default]
    Timeline,
    /// Indented span tree
    Hierarchy,
    /// Flat span table
    Spans,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Fetch one trace and render it in the terminal
    Show(ShowArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct ShowArgs {
    /// Trace id to fetch
    pub trace_id: String,

    /// Window start, epoch milliseconds
    #[arg(long)]
    pub from: Option<i64>,

    /// Window end, epoch milliseconds
    #[arg(long)]
    pub to: Option<i64>,

    /// Span ids to collapse (repeatable)
    #[arg(long = "collapse", value_name = "SPAN_ID")]
    pub collapse: Vec<String>,

    #[arg(long, value_enum, default_value_t = ShowMode::Timeline)]
    pub mode: ShowMode,

    /// Sort key for the span table
    #[arg(long, default_value = "start_time", value_parser = parse_sort_key)]
    pub sort: SortKey,

    /// Sort the span table in descending order
    #[arg(long)]
    pub desc: bool,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub backend_url: Option<String>,
    pub backend_dir: Option<PathBuf>,
    pub timestamp_unit: Option<TimestampUnit>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        backend: cli.backend,
        backend_url: cli.backend_url,
        backend_dir: cli.backend_dir,
        timestamp_unit: cli.timestamp_unit,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show_command() {
        let cli = Cli::try_parse_from([
            "tracelens",
            "--backend",
            "file",
            "--backend-dir",
            "/tmp/traces",
            "show",
            "abc123",
            "--collapse",
            "s1",
            "--collapse",
            "s2",
            "--mode",
            "spans",
            "--sort",
            "duration",
            "--desc",
        ])
        .unwrap();

        assert_eq!(cli.backend, Some(BackendKind::File));
        assert_eq!(cli.backend_dir, Some(PathBuf::from("/tmp/traces")));
        match cli.command {
            Some(Commands::Show(args)) => {
                assert_eq!(args.trace_id, "abc123");
                assert_eq!(args.collapse, vec!["s1", "s2"]);
                assert_eq!(args.mode, ShowMode::Spans);
                assert_eq!(args.sort, SortKey::Duration);
                assert!(args.desc);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["tracelens", "-p", "7000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(7000));
    }

    #[test]
    fn test_parse_backend_kind_rejects_unknown() {
        assert!(parse_backend_kind("jaeger").is_err());
        assert_eq!(parse_backend_kind("ZIPKIN").unwrap(), BackendKind::Zipkin);
    }
}
