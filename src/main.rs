//! Static site server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ metrics ─▶ security headers ─▶ compression
//!                                                                                │
//!                                                                                ▼
//!     Client Response                                                      panic catcher
//!     ◀──────────────  (headers accumulate on the way back out)                  │
//!                                                                                ▼
//!                                                          GET / ─▶ index.html   │
//!                                                          * ─▶ public root ─▶ 404
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use static_site_server::config::{self, ServerConfig};
use static_site_server::http::HttpServer;
use static_site_server::lifecycle::{startup, Shutdown};
use static_site_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "static-site-server")]
#[command(about = "Serve a static site with security headers, compression and cache policy", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Public root directory (overrides the config file)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("static-site-server: configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    logging::init(&config.observability.log_level);

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<ServerConfig, config::ConfigError> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config.assets.root = root.clone();
    }
    Ok(config)
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        root = %config.assets.root.display(),
        port = config.listener.port,
        compression = config.compression.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    startup::check_public_root(&config.assets);
    let server = HttpServer::new(config)?;
    let listener = startup::bind(&server.config().listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.on_termination_signal();

    server.run(listener, server_shutdown).await?;
    Ok(())
}
