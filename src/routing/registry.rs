//! Service registry: the immutable routing table.
//!
//! # Responsibilities
//! - Validate service entries once at startup
//! - Resolve a request path to its owning entry and remainder
//! - Expose a stable, ordered listing for introspection
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Prefixes must be pairwise non-overlapping, so at most one entry can
//!   ever match; resolution still picks the longest match
//! - O(n) prefix scan (acceptable for typical service counts)

use std::collections::HashSet;

use axum::http::Uri;
use url::Url;

use crate::config::ConfigError;
use crate::routing::matcher::PathPrefixMatcher;

/// One registered backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Unique human-readable key.
    pub name: String,
    /// Exact path prefix owned by this entry.
    pub url_prefix: String,
    /// Absolute base URL of the backend.
    pub target_base_url: String,
    /// Prepended to the remainder path before forwarding. May be empty.
    pub path_rewrite: String,
    /// Surfaced via introspection only.
    pub description: String,
}

/// A successful path resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'r, 'p> {
    pub entry: &'r ServiceEntry,
    /// Path after the prefix, byte-for-byte. Empty when the path equals the prefix.
    pub remainder: &'p str,
}

/// The routing table, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
    matchers: Vec<PathPrefixMatcher>,
}

impl ServiceRegistry {
    /// Validate and freeze the given entries, preserving their order.
    pub fn load(entries: Vec<ServiceEntry>) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();

        for entry in &entries {
            if entry.name.is_empty() {
                return Err(ConfigError::EmptyName {
                    prefix: entry.url_prefix.clone(),
                });
            }
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: entry.name.clone(),
                });
            }
            if entry.url_prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix {
                    name: entry.name.clone(),
                });
            }
            if !entry.url_prefix.starts_with('/') {
                return Err(ConfigError::PrefixMissingSlash {
                    name: entry.name.clone(),
                    prefix: entry.url_prefix.clone(),
                });
            }
            validate_target_url(entry)?;
        }

        let matchers: Vec<PathPrefixMatcher> = entries
            .iter()
            .map(|e| PathPrefixMatcher::new(e.url_prefix.clone()))
            .collect();

        for (i, a) in matchers.iter().enumerate() {
            for (j, b) in matchers.iter().enumerate().skip(i + 1) {
                if a.prefix() == b.prefix() {
                    return Err(ConfigError::DuplicatePrefix {
                        prefix: a.prefix().to_string(),
                        first: entries[i].name.clone(),
                        second: entries[j].name.clone(),
                    });
                }
                if a.overlaps(b) {
                    let (outer, inner) = if a.prefix().len() < b.prefix().len() {
                        (i, j)
                    } else {
                        (j, i)
                    };
                    return Err(ConfigError::OverlappingPrefix {
                        outer: entries[outer].url_prefix.clone(),
                        outer_name: entries[outer].name.clone(),
                        inner: entries[inner].url_prefix.clone(),
                        inner_name: entries[inner].name.clone(),
                    });
                }
            }
        }

        Ok(Self { entries, matchers })
    }

    /// Find the entry owning `path` (longest matching prefix) and the remainder.
    pub fn resolve<'p>(&self, path: &'p str) -> Option<Resolved<'_, 'p>> {
        self.matchers
            .iter()
            .zip(&self.entries)
            .filter_map(|(matcher, entry)| {
                matcher
                    .strip(path)
                    .map(|remainder| Resolved { entry, remainder })
            })
            .max_by_key(|resolved| resolved.entry.url_prefix.len())
    }

    /// All entries in registration order.
    pub fn list(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_target_url(entry: &ServiceEntry) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTargetUrl {
        name: entry.name.clone(),
        url: entry.target_base_url.clone(),
        reason: reason.to_string(),
    };

    let url = Url::parse(&entry.target_base_url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    // Url accepts and percent-encodes input that the outbound client rejects
    entry
        .target_base_url
        .parse::<Uri>()
        .map_err(|e| invalid(&e.to_string()))?;
    Ok(())
}
