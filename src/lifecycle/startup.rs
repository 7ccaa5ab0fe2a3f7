//! Startup orchestration.
//!
//! # Responsibilities
//! - Build and validate the service registry from configuration
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::{service_entries, ConfigError, GatewayConfig};
use crate::http::GatewayServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::routing::ServiceRegistry;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize outbound TLS: {0}")]
    Tls(#[source] std::io::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metrics address {address:?}: {reason}")]
    Metrics { address: String, reason: String },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the registry for `config`, logging every registered service.
pub fn build_registry(config: &GatewayConfig) -> Result<ServiceRegistry, ConfigError> {
    let registry = ServiceRegistry::load(service_entries(config))?;

    for entry in registry.list() {
        tracing::info!(
            service = %entry.name,
            prefix = %entry.url_prefix,
            target = %entry.target_base_url,
            rewrite = %entry.path_rewrite,
            "Registered service"
        );
    }
    if registry.is_empty() {
        tracing::warn!("No services registered, every proxied path will return 404");
    }

    Ok(registry)
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let registry = build_registry(&config)?;

    if config.observability.metrics_enabled {
        let address = config.observability.metrics_address.clone();
        let addr: SocketAddr = address.parse().map_err(|e: std::net::AddrParseError| {
            StartupError::Metrics {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics {
            address,
            reason: e.to_string(),
        })?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = GatewayServer::new(config, registry).map_err(StartupError::Tls)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::wait_for_signal(shutdown.clone()));

    server.run(listener, shutdown).await.map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
