//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Propagate it to the backend and echo it on the response
//! - Extract client information for X-Forwarded-* headers
//!
//! # Design Decisions
//! - An ID supplied by the client is kept, so callers can correlate
//! - The ID is attached to the tracing span of every request

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderName, Request};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Span;

use crate::proxy::ClientInfo;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns an `x-request-id` to requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request ID assigned by [`set_request_id_layer`], or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(&X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("unknown")
        .to_string()
}

/// Span for the trace layer, tagged with method, URI and request ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request),
    )
}

/// Who sent this request, for X-Forwarded-*.
pub fn client_info<B>(request: &Request<B>) -> ClientInfo {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let host = request.headers().get(header::HOST).cloned().or_else(|| {
        request
            .uri()
            .authority()
            .and_then(|a| header::HeaderValue::from_str(a.as_str()).ok())
    });

    ClientInfo {
        ip,
        proto: "http",
        host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_info_from_connect_info_and_host() {
        let mut request = Request::builder()
            .uri("/api/users")
            .header(header::HOST, "gateway.local:8080")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("192.0.2.10:51234".parse::<SocketAddr>().unwrap()));

        let info = client_info(&request);
        assert_eq!(info.ip, Some("192.0.2.10".parse().unwrap()));
        assert_eq!(info.host.unwrap(), "gateway.local:8080");
        assert_eq!(info.proto, "http");
    }

    #[test]
    fn client_info_falls_back_to_authority() {
        let request = Request::builder()
            .uri("http://gateway.local/api/users")
            .body(Body::empty())
            .unwrap();

        let info = client_info(&request);
        assert_eq!(info.ip, None);
        assert_eq!(info.host.unwrap(), "gateway.local");
    }

    #[test]
    fn request_id_reads_header_when_unset() {
        let request = Request::builder()
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&request), "abc-123");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(request_id(&request), "unknown");
    }
}
