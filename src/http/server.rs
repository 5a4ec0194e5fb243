//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay and bridge handlers
//! - Wire up middleware (tracing, request ID, security headers)
//! - Bind server to listener
//! - Swap in reloaded policy without touching in-flight exchanges

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, ProxyPolicy};
use crate::error::ProxyError;
use crate::http::relay::{relay_handler, HttpRelay};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::websocket::websocket_handler;
use crate::lifecycle::shutdown;
use crate::routing::UrlRewriter;
use crate::security;

/// Everything a handler needs for one policy snapshot.
#[derive(Debug)]
pub struct ProxyRuntime {
    pub policy: ProxyPolicy,
    pub relay: HttpRelay,
    pub rewriter: UrlRewriter,
}

impl ProxyRuntime {
    pub fn new(policy: ProxyPolicy) -> Result<Self, ProxyError> {
        Ok(Self {
            relay: HttpRelay::new(&policy)?,
            rewriter: UrlRewriter::from_policy(&policy),
            policy,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    runtime: Arc<ArcSwap<ProxyRuntime>>,
}

impl AppState {
    pub fn new(runtime: ProxyRuntime) -> Self {
        Self {
            runtime: Arc::new(ArcSwap::from_pointee(runtime)),
        }
    }

    /// Snapshot taken once per request; later reloads do not affect it.
    pub fn runtime(&self) -> Arc<ProxyRuntime> {
        self.runtime.load_full()
    }

    /// Replace the live runtime.
    pub fn replace(&self, runtime: ProxyRuntime) {
        self.runtime.store(Arc::new(runtime));
    }
}

/// Error building the server from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Config(Vec<crate::config::validation::ValidationError>),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let policy = ProxyPolicy::from_config(&config).map_err(ServerError::Config)?;
        let state = AppState::new(ProxyRuntime::new(policy)?);
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let prefix = config.upstream.path_prefix.as_str();

        let router = Router::new()
            .route(
                &format!("{prefix}/ws"),
                get(websocket_handler)
                    .head(relay_handler)
                    .fallback(relay_handler),
            )
            .route(prefix, any(relay_handler))
            .route(&format!("{prefix}/"), any(relay_handler))
            .route(&format!("{prefix}/{{*path}}"), any(relay_handler))
            .with_state(state);

        let router = if config.security.enable_headers {
            security::headers::apply(router)
        } else {
            router
        };

        router
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Router with all layers, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configurations arriving on `config_updates` replace the live policy.
    /// Listener and mount settings are fixed at startup.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.host,
            prefix = %self.config.upstream.path_prefix,
            dev_mode = self.config.upstream.dev_mode,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let mount = self.config.upstream.path_prefix.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if config.upstream.path_prefix != mount {
                    tracing::warn!(
                        current = %mount,
                        requested = %config.upstream.path_prefix,
                        "Mount prefix changes need a restart; keeping current prefix"
                    );
                }
                let mut config = config;
                config.upstream.path_prefix = mount.clone();

                match ProxyPolicy::from_config(&config)
                    .map_err(ServerError::Config)
                    .and_then(|policy| Ok(ProxyRuntime::new(policy)?))
                {
                    Ok(runtime) => {
                        tracing::info!(upstream = %config.upstream.host, "Policy reloaded");
                        state.replace(runtime);
                    }
                    Err(e) => tracing::error!(error = %e, "Policy reload rejected"),
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}
