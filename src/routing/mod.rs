//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (routing decision)
//!     → registry.rs (longest owning prefix + remainder)
//!     → matcher.rs (prefix test and strip)
//!     → Return: Forward { entry, remainder } or NotFound
//!
//! Registry construction (at startup):
//!     ServiceEntry[]
//!     → Validate names, prefixes, target URLs
//!     → Reject duplicate or overlapping prefixes
//!     → Freeze as immutable ServiceRegistry
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always resolves to the same entry

pub mod matcher;
pub mod registry;
pub mod router;

pub use registry::{Resolved, ServiceEntry, ServiceRegistry};
pub use router::{RouteDecision, Router};
