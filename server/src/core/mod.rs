//! Core application infrastructure

pub(crate) mod banner;
pub mod cli;
pub mod config;
pub mod constants;
pub(crate) mod render;
pub mod shutdown;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands, ShowArgs, ShowMode};
pub use config::{AppConfig, BackendConfig, BackendKind, ServerConfig, ViewsConfig};
pub use shutdown::ShutdownService;
