//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional) + environment
//!     → loader.rs (parse, env overrides, resolve base URLs)
//!     → GatewayConfig (immutable)
//!     → service_entries() → ServiceRegistry::load (validation)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Built-in service catalogue when the file lists none

pub mod defaults;
pub mod loader;
pub mod schema;

pub use loader::{load_config, process_env, service_entries, ConfigError};
pub use schema::{
    CorsConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig,
    TimeoutConfig,
};
