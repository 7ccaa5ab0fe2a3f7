//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::defaults::default_services;
use crate::config::schema::GatewayConfig;
use crate::routing::registry::ServiceEntry;

/// Error type for configuration loading and registry validation.
///
/// Every variant is fatal: the gateway refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid bind address {address:?}: {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("Service name must not be empty (prefix {prefix:?})")]
    EmptyName { prefix: String },

    #[error("Service {name:?} has an empty prefix")]
    EmptyPrefix { name: String },

    #[error("Service {name:?} prefix {prefix:?} must start with '/'")]
    PrefixMissingSlash { name: String, prefix: String },

    #[error("Duplicate service name {name:?}")]
    DuplicateName { name: String },

    #[error("Duplicate prefix {prefix:?} ({first:?} and {second:?})")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("Ambiguous prefixes: {outer:?} ({outer_name:?}) is a prefix of {inner:?} ({inner_name:?})")]
    OverlappingPrefix {
        outer: String,
        outer_name: String,
        inner: String,
        inner_name: String,
    },

    #[error("Service {name:?} has invalid target URL {url:?}: {reason}")]
    InvalidTargetUrl {
        name: String,
        url: String,
        reason: String,
    },
}

/// Load configuration from an optional TOML file, then apply environment overrides.
///
/// `env` looks up an environment variable; pass [`process_env`] in production.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: GatewayConfig = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    if config.services.is_empty() {
        config.services = default_services();
    }

    for service in &mut config.services {
        if service.url.is_none() {
            service.url = service
                .url_env
                .as_deref()
                .and_then(&env)
                .filter(|url| !url.trim().is_empty());
        }
    }

    apply_env_overrides(&mut config, &env)?;
    Ok(config)
}

/// Environment lookup backed by the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn apply_env_overrides<F>(config: &mut GatewayConfig, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut addr: SocketAddr =
        config
            .listener
            .bind_address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidBindAddress {
                address: config.listener.bind_address.clone(),
                reason: e.to_string(),
            })?;

    if let Some(port) = env("PORT") {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
            reason: format!("PORT={port} is not a valid port"),
        })?;
        addr.set_port(port);
    }
    config.listener.bind_address = addr.to_string();

    if let Some(origin) = env("FRONTEND_URL").filter(|o| !o.is_empty()) {
        config.cors.allowed_origin = origin;
    }

    if env("NODE_ENV").as_deref() == Some("development") {
        config.dev_mode = true;
    }
    if let Some(flag) = env("GATEWAY_DEV_MODE") {
        config.dev_mode = matches!(flag.as_str(), "1" | "true" | "yes");
    }

    if let Some(level) = env("GATEWAY_LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(())
}

/// Registry entries for every service with a resolved base URL.
///
/// Services without a URL are logged and left out.
pub fn service_entries(config: &GatewayConfig) -> Vec<ServiceEntry> {
    config
        .services
        .iter()
        .filter_map(|service| match &service.url {
            Some(url) => Some(ServiceEntry {
                name: service.name.clone(),
                url_prefix: service.prefix.clone(),
                target_base_url: url.clone(),
                path_rewrite: service.path_rewrite.clone(),
                description: if service.description.is_empty() {
                    service.name.clone()
                } else {
                    service.description.clone()
                },
            }),
            None => {
                tracing::warn!(
                    service = %service.name,
                    prefix = %service.prefix,
                    url_env = ?service.url_env,
                    "No base URL configured, service not registered"
                );
                None
            }
        })
        .collect()
}
