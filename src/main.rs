//! Origin relay (v1)
//!
//! A transparent edge relay built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 ORIGIN RELAY                  │
//!     Client Request   │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!     ─────────────────┼─▶│  http  │───▶│ security │───▶│ routing  │  │
//!                      │  │ server │    │  guards  │    │ rewrite  │  │
//!                      │  └────────┘    └──────────┘    └────┬─────┘  │
//!                      │                                     │        │
//!                      │                ┌────────────────────┤        │
//!                      │                ▼                    ▼        │
//!                      │         ┌────────────┐      ┌────────────┐   │
//!     Client Response  │         │ http relay │      │   bridge   │◀──┼──── Origin
//!     ◀────────────────┼─────────│ (reqwest)  │      │ (ws pump)  │   │
//!                      │         └────────────┘      └────────────┘   │
//!                      │                                              │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use origin_relay::config::loader::{check_config, read_config};
use origin_relay::config::watcher::ConfigWatcher;
use origin_relay::lifecycle::signals::spawn_signal_listener;
use origin_relay::observability::{logging, metrics};
use origin_relay::{HttpServer, ProxyConfig, Shutdown};

#[derive(Parser, Debug, Clone)]
#[command(name = "origin-relay", version, about = "Transparent edge relay for a single origin")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes
    #[arg(long, requires = "config")]
    watch: bool,

    /// Origin authority (host or host:port)
    #[arg(long, env = "UPSTREAM_HOST")]
    upstream_host: Option<String>,

    /// Use plain http/ws upstream and skip the identity guard
    #[arg(long, env = "DEV_MODE")]
    dev_mode: bool,

    /// Listener bind address
    #[arg(long, env = "BIND_ADDRESS")]
    bind: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ProxyConfig) {
        if let Some(host) = &self.upstream_host {
            config.upstream.host = host.clone();
        }
        if self.dev_mode {
            config.upstream.dev_mode = true;
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply_overrides(&mut config);
    check_config(&config)?;

    logging::init_logging(config.observability.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "origin-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.host,
        prefix = %config.upstream.path_prefix,
        dev_mode = config.upstream.dev_mode,
        "Configuration loaded"
    );
    if config.upstream.dev_mode {
        tracing::warn!("Dev mode: plaintext upstream, identity guard disabled");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The notify handle must outlive the server or events stop.
    let (forward_tx, config_updates) = mpsc::unbounded_channel();
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let overrides = cli.clone();
            tokio::spawn(async move {
                while let Some(mut config) = updates.recv().await {
                    overrides.apply_overrides(&mut config);
                    if forward_tx.send(config).is_err() {
                        break;
                    }
                }
            });
            Some(handle)
        }
        _ => None,
    };

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
