//! pscloud-exporter - Prometheus exporter for PS Cloud (ps.kz) accounts.
//!
//! Every request to the telemetry path runs one scrape cycle against the
//! provider's GraphQL API and serves the result in the Prometheus text format.

mod config;
mod handlers;
mod state;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use prometheus::Registry;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pscloud_core::Exporter;
use pscloud_core::source::GraphQlSource;

use config::{Overrides, WebSettings};
use state::AppInner;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "pscloud-exporter",
    about = "Prometheus exporter for PS Cloud accounts",
    version = pscloud_core::VERSION,
    long_version = pscloud_core::LONG_VERSION
)]
struct Args {
    /// Path to the TOML config file. Defaults to ./config.toml when present.
    #[arg(long, value_name = "PATH", env = "PSCLOUD_CONFIG")]
    config: Option<PathBuf>,

    /// API token of the PS Cloud account.
    #[arg(long, env = "PSCLOUD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Service id enabling the VPC/VPS server-by-service sources.
    #[arg(long, env = "PSCLOUD_SERVICE_ID")]
    service_id: Option<String>,

    /// Provider console URL.
    #[arg(long, env = "PSCLOUD_BASE_URL")]
    base_url: Option<String>,

    /// Address to listen on for HTTP requests [default: 0.0.0.0:9116].
    #[arg(long, env = "WEB_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// Path under which metrics are exposed [default: /metrics].
    #[arg(long, env = "WEB_TELEMETRY_PATH")]
    metrics_path: Option<String>,

    /// Prefix of every metric name [default: pskz].
    #[arg(long, env = "WEB_METRICS_PREFIX")]
    metrics_prefix: Option<String>,

    /// Deadline of each source request, e.g. "10s" [default: 10s].
    #[arg(long, env = "PSCLOUD_SOURCE_TIMEOUT", value_parser = parse_timeout)]
    source_timeout: Option<Duration>,

    /// Number of sources fetched concurrently within one scrape [default: 1].
    #[arg(long)]
    max_parallel_fetches: Option<usize>,

    /// Start without validating the token against the account API.
    #[arg(long)]
    skip_auth_check: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            token: self.token.clone(),
            service_id: self.service_id.clone(),
            base_url: self.base_url.clone(),
            listen_address: self.listen_address.clone(),
            telemetry_path: self.metrics_path.clone(),
            metrics_prefix: self.metrics_prefix.clone(),
            source_timeout: self.source_timeout,
            max_parallel_fetches: self.max_parallel_fetches,
        }
    }
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    config::parse_duration(s).map_err(|e| e.to_string())
}

/// Initializes the tracing subscriber. `RUST_LOG` adds further directives.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["pscloud_exporter", "pscloud_core"] {
        match format!("{target}={level}").parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {target}: {e}"),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ============================================================
// Main
// ============================================================

fn main() {
    // Env files must be in the environment before clap reads it.
    let env_files = config::load_env_files();
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match env_files {
        Ok(files) => {
            for path in files {
                debug!(path = %path.display(), "loaded env file");
            }
        }
        Err(e) => {
            error!(error = %e, "failed to load env file");
            process::exit(1);
        }
    }

    let settings = match config::load(args.config.as_deref(), args.overrides()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            process::exit(1);
        }
    };
    info!(
        version = pscloud_core::VERSION,
        build = pscloud_core::BUILD,
        config = ?settings.config_path,
        base_url = %settings.graphql.base_url,
        sources = settings.scrape.sources.len(),
        "starting"
    );

    // The blocking client owns its own runtime and must be built outside tokio.
    let source = match GraphQlSource::new(settings.graphql.clone()) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "failed to build API client");
            process::exit(1);
        }
    };

    if args.skip_auth_check {
        warn!("token validation skipped");
    } else {
        match source.test_auth(settings.scrape.source_timeout) {
            Ok(identity) => info!(
                account_id = identity.id.as_deref().unwrap_or("unknown"),
                email = identity.email.as_deref().unwrap_or("unknown"),
                "token validated"
            ),
            Err(e) => {
                error!(kind = e.kind(), error = %e, "token validation failed");
                process::exit(1);
            }
        }
    }

    let exporter = match Exporter::new(source, settings.scrape.clone()) {
        Ok(exporter) => exporter,
        Err(e) => {
            error!(error = %e, "failed to build exporter");
            process::exit(1);
        }
    };
    let registry = Registry::new();
    if let Err(e) = registry.register(Box::new(exporter)) {
        error!(error = %e, "failed to register exporter");
        process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    let result = runtime.block_on(serve(settings.web, registry.clone()));
    drop(runtime);
    // Last registry handle: the blocking client is dropped outside the runtime.
    drop(registry);

    if let Err(e) = result {
        error!(error = %e, "server error");
        process::exit(1);
    }
    info!("stopped");
}

async fn serve(web: WebSettings, registry: Registry) -> std::io::Result<()> {
    let state = Arc::new(AppInner {
        registry,
        telemetry_path: web.telemetry_path,
    });
    let app = handlers::router(state.clone());

    let listener = tokio::net::TcpListener::bind(web.listen_address).await?;
    info!(addr = %web.listen_address, path = %state.telemetry_path, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
