//! Core application

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, Commands, ShowArgs, ShowMode};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::render;
use crate::core::shutdown::ShutdownService;
use crate::data::{TimeRange, create_backend};
use crate::domain::traces::{FlatSort, SortOrder};
use crate::domain::{TraceView, ViewRegistry};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub views: ViewRegistry,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        Self::init_logging(cli_config.debug);

        tracing::debug!("Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;

        match command {
            Some(Commands::Show(args)) => Self::show(&config, args).await,
            Some(Commands::Start) | None => {
                let app = Self::init(config)?;
                Self::start_server(app).await
            }
        }
    }

    fn init(config: AppConfig) -> Result<Self> {
        let backend =
            create_backend(&config.backend).context("Failed to initialize tracing backend")?;
        let views = ViewRegistry::new(backend, &config.views);

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            views,
        })
    }

    fn init_logging(debug: bool) {
        let level = if debug { "debug" } else { "info" };
        let default_filter = format!("{level},{APP_NAME_LOWER}={level}");

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Fetch one trace and print the selected projection
    async fn show(config: &AppConfig, args: ShowArgs) -> Result<()> {
        let backend =
            create_backend(&config.backend).context("Failed to initialize tracing backend")?;
        let range = TimeRange::new(args.from, args.to)?;

        let view = TraceView::new(backend);
        let trace = view
            .load_trace(&args.trace_id, range)
            .await
            .with_context(|| format!("Failed to load trace {}", args.trace_id))?;

        for span_id in &args.collapse {
            if trace.index_of(span_id).is_none() {
                tracing::warn!(span_id = %span_id, "Cannot collapse unknown span");
                continue;
            }
            if !view.collapsed().is_collapsed(span_id) {
                view.toggle_collapse(span_id);
            }
        }

        let mut out = render::render_summary(&view.summary()?);
        out.push('\n');
        match args.mode {
            ShowMode::Timeline => out.push_str(&render::render_timeline(
                &view.visible_timeline()?,
                &view.time_markers()?,
            )),
            ShowMode::Hierarchy => out.push_str(&render::render_hierarchy(&view.hierarchy_rows()?)),
            ShowMode::Spans => {
                let order = if args.desc {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
                let rows = view.flat_rows(FlatSort::new(args.sort, order))?;
                out.push_str(&render::render_spans(&rows));
            }
        }
        print!("{out}");
        Ok(())
    }

    async fn start_server(app: Self) -> Result<()> {
        // Before anything that can block
        app.shutdown.install_signal_handlers();

        app.shutdown
            .register(app.views.start_maintenance(app.shutdown.subscribe()))
            .await;

        banner::print_banner(&app.config);

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
