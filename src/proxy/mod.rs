//! Reverse-proxy dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! (entry, remainder, inbound request)
//!     → request.rs (target URL, header policy, streaming body)
//!     → dispatcher.rs (send, await headers under deadline)
//!     → Ok(backend response) | Err(DispatchFailure)
//!     → error.rs (failure taxonomy, classification)
//! ```

pub mod dispatcher;
pub mod error;
pub mod headers;
pub mod request;

pub use dispatcher::Dispatcher;
pub use error::{DispatchFailure, DispatchFailureKind};
pub use headers::ClientInfo;
pub use request::ForwardedRequest;
