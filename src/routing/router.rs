//! Request routing.
//!
//! # Responsibilities
//! - Turn an inbound request path into a routing decision
//! - Return the owning entry plus remainder, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Only the path is consulted; the query string travels separately
//! - Explicit NotFound rather than silent default

use std::sync::Arc;

use crate::routing::registry::{ServiceEntry, ServiceRegistry};

/// Outcome of routing a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    /// Forward to `entry` with `remainder` appended after its path rewrite.
    Forward {
        entry: &'a ServiceEntry,
        remainder: String,
    },
    /// No registered prefix owns the path.
    NotFound,
}

/// Routes requests against the shared registry.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<ServiceRegistry>,
}

impl Router {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Route a request path (without query string).
    pub fn route(&self, path: &str) -> RouteDecision<'_> {
        match self.registry.resolve(path) {
            Some(resolved) => RouteDecision::Forward {
                entry: resolved.entry,
                remainder: resolved.remainder.to_string(),
            },
            None => RouteDecision::NotFound,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }
}
