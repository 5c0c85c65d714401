//! Startup banner and URL display

use super::config::{AppConfig, BackendKind, is_all_interfaces};
use super::constants::{APP_NAME, CURRENT_VERSION};
use crate::utils::terminal::terminal_link;

/// Print the startup banner with URLs
pub fn print_banner(config: &AppConfig) {
    let host = config.server.host.as_str();
    let port = config.server.port;
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    // Label width: "Tracing backend:" is 16 chars, pad to 18 for alignment
    const W: usize = 18;

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME, CURRENT_VERSION
    );
    println!();

    let api_url = format!("http://{}:{}/api/v1", display_host, port);
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "API:",
        terminal_link(&api_url)
    );

    let openapi_url = format!("http://{}:{}/api/openapi.json", display_host, port);
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "OpenAPI:",
        terminal_link(&openapi_url)
    );

    let source = match &config.backend.dir {
        Some(dir) if config.backend.kind == BackendKind::File => {
            dir.display().to_string()
        }
        _ => config.backend.url.clone(),
    };
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {} \x1b[90m({}, {})\x1b[0m",
        "Tracing backend:", source, config.backend.kind, config.backend.timestamp_unit
    );

    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    println!();
}
