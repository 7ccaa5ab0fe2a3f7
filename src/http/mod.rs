//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, client info)
//!     → introspection.rs (/health, /services short-circuit)
//!     → [routing decides owning service]
//!     → [proxy dispatches to backend]
//!     → response.rs (relay verbatim, or map gateway error to JSON)
//!     → Send to client
//! ```

pub mod introspection;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ErrorMapper, GatewayError};
pub use server::{AppState, GatewayServer};
