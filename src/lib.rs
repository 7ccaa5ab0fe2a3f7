//! API gateway: a single HTTP entry point that routes requests by path
//! prefix to backend services and relays their responses.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::Router ──▶ proxy::Dispatcher ──▶ Backend
//!                          │                 │                    │
//!                          │            (no match)           (failure)
//!                          ▼                 ▼                    ▼
//!                   introspection      http::response::ErrorMapper (404 / 502 JSON)
//!     Client Response
//!     ◀────────────── backend response relayed verbatim, or gateway error
//! ```
//!
//! Cross-cutting: `config` (TOML + environment), `observability`
//! (tracing, Prometheus), `lifecycle` (startup, signals, shutdown).

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routing::{ServiceEntry, ServiceRegistry};
