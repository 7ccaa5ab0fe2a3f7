//! Forwarded request construction.
//!
//! # Responsibilities
//! - Compute the target URL: base + path rewrite + remainder + original query
//! - Copy headers minus hop-by-hop, add X-Forwarded-*
//! - Carry the inbound body through as a stream
//!
//! # Design Decisions
//! - Rewrite and remainder are concatenated literally
//! - Only the seam between base URL and suffix is touched: a trailing '/' on
//!   the base is dropped when the suffix starts with '/', and a '/' is
//!   inserted when a path-less base meets a suffix without one (otherwise
//!   the suffix would extend the host name)
//! - Host is not forwarded; the client sets it from the target authority

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Uri, Version};
use url::Url;

use crate::proxy::error::{DispatchFailure, DispatchFailureKind};
use crate::proxy::headers::{apply_forwarded, strip_hop_by_hop, ClientInfo};
use crate::routing::ServiceEntry;

/// Build `base + rewrite + remainder`, then append `?query` if present.
pub fn target_url(base: &str, rewrite: &str, remainder: &str, query: Option<&str>) -> String {
    let suffix = format!("{rewrite}{remainder}");
    let mut url = String::with_capacity(base.len() + suffix.len() + 16);

    if suffix.starts_with('/') {
        url.push_str(base.strip_suffix('/').unwrap_or(base));
    } else {
        url.push_str(base);
        if !suffix.is_empty() && !base.ends_with('/') && !has_path(base) {
            url.push('/');
        }
    }
    url.push_str(&suffix);

    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn has_path(base: &str) -> bool {
    Url::parse(base)
        .map(|u| u.path() != "/" || base.ends_with('/'))
        .unwrap_or(false)
}

/// An inbound request rewritten for one backend.
#[derive(Debug)]
pub struct ForwardedRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ForwardedRequest {
    /// Rewrite `request` for `entry`. `remainder` is the path after the entry's prefix.
    pub fn build(
        entry: &ServiceEntry,
        remainder: &str,
        request: Request<Body>,
        client: &ClientInfo,
    ) -> Result<Self, DispatchFailure> {
        let (parts, body) = request.into_parts();

        let target = target_url(
            &entry.target_base_url,
            &entry.path_rewrite,
            remainder,
            parts.uri.query(),
        );
        let uri: Uri = target.parse().map_err(|e: axum::http::uri::InvalidUri| {
            DispatchFailure::new(
                DispatchFailureKind::InvalidTarget,
                &entry.name,
                &entry.url_prefix,
                format!("{target}: {e}"),
            )
        })?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        apply_forwarded(&mut headers, client);

        Ok(Self {
            method: parts.method,
            uri,
            // The client negotiates the upstream protocol itself
            version: Version::HTTP_11,
            headers,
            body,
        })
    }

    pub fn into_request(self) -> Request<Body> {
        let mut request = Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn entry(base: &str, rewrite: &str) -> ServiceEntry {
        ServiceEntry {
            name: "users".into(),
            url_prefix: "/api/users".into(),
            target_base_url: base.into(),
            path_rewrite: rewrite.into(),
            description: "Usuarios".into(),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip: Some("127.0.0.1".parse().unwrap()),
            proto: "http",
            host: Some(header::HeaderValue::from_static("localhost:8080")),
        }
    }

    #[test]
    fn target_url_with_rewrite() {
        assert_eq!(
            target_url("https://users.example", "/v1", "/auth/login", None),
            "https://users.example/v1/auth/login"
        );
    }

    #[test]
    fn target_url_keeps_query_and_trailing_slash() {
        assert_eq!(
            target_url("https://ch.example", "", "/channels/", Some("page=1")),
            "https://ch.example/channels/?page=1"
        );
    }

    #[test]
    fn target_url_empty_remainder() {
        assert_eq!(
            target_url("https://ch.example", "", "", None),
            "https://ch.example"
        );
        assert_eq!(
            target_url("https://users.example", "/v1", "", None),
            "https://users.example/v1"
        );
        assert_eq!(
            target_url("https://ch.example", "", "", Some("q=a%20b&x=")),
            "https://ch.example?q=a%20b&x="
        );
    }

    #[test]
    fn target_url_seam_between_base_and_suffix() {
        // Trailing slash on the base is not doubled
        assert_eq!(
            target_url("http://files:7000/", "", "/abc", None),
            "http://files:7000/abc"
        );
        // Base with a path keeps it
        assert_eq!(
            target_url("http://files:7000/v1", "", "/abc", None),
            "http://files:7000/v1/abc"
        );
        // Remainder without a leading slash never touches the authority
        assert_eq!(
            target_url("http://users:3000", "", "X", None),
            "http://users:3000/X"
        );
        // ...but is otherwise literal
        assert_eq!(
            target_url("http://users:3000/v1", "", "X", None),
            "http://users:3000/v1X"
        );
        // Slashes inside the suffix are never normalized
        assert_eq!(
            target_url("http://users:3000", "/v1", "//a", None),
            "http://users:3000/v1//a"
        );
    }

    #[test]
    fn build_rewrites_uri_and_headers() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users/auth/login?next=%2Fhome")
            .header(header::HOST, "localhost:8080")
            .header(header::CONNECTION, "keep-alive")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", "req-1")
            .body(Body::from(r#"{"email":"a@b.c"}"#))
            .unwrap();

        let forwarded = ForwardedRequest::build(
            &entry("https://users.example", "/v1"),
            "/auth/login",
            request,
            &client(),
        )
        .unwrap();

        assert_eq!(forwarded.method, Method::POST);
        assert_eq!(
            forwarded.uri.to_string(),
            "https://users.example/v1/auth/login?next=%2Fhome"
        );
        assert!(!forwarded.headers.contains_key(header::HOST));
        assert!(!forwarded.headers.contains_key(header::CONNECTION));
        assert_eq!(forwarded.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(forwarded.headers["x-request-id"], "req-1");
        assert_eq!(forwarded.headers["x-forwarded-for"], "127.0.0.1");
        assert_eq!(forwarded.headers["x-forwarded-host"], "localhost:8080");

        let request = forwarded.into_request();
        assert_eq!(request.uri().path(), "/v1/auth/login");
        assert_eq!(request.method(), &Method::POST);
    }

    #[test]
    fn build_rejects_unparseable_target() {
        let request = Request::builder()
            .uri("/api/users/x")
            .body(Body::empty())
            .unwrap();

        let err = ForwardedRequest::build(
            &entry("http://users:3000", "/bad path"),
            "/x",
            request,
            &client(),
        )
        .unwrap_err();
        assert_eq!(err.kind, DispatchFailureKind::InvalidTarget);
        assert_eq!(err.service_prefix, "/api/users");
    }
}
