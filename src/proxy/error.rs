//! Dispatch failure taxonomy.
//!
//! Every failure here is gateway-origin: the backend never produced a
//! response we could relay. Backend status codes (4xx/5xx) are not errors
//! at this layer and never reach this module.

use std::error::Error as StdError;
use std::fmt;

/// Why a dispatch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchFailureKind {
    /// TCP connect failed (refused, reset, unreachable).
    ConnectionRefused,
    /// Backend host name did not resolve.
    DnsFailure,
    /// No response headers within the upstream deadline.
    Timeout,
    /// TLS handshake or certificate failure.
    TlsError,
    /// The backend answered with something that is not valid HTTP, or hung up mid-response.
    MalformedResponse,
    /// The computed target URL is not a valid URI.
    InvalidTarget,
}

impl DispatchFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchFailureKind::ConnectionRefused => "connection_refused",
            DispatchFailureKind::DnsFailure => "dns_failure",
            DispatchFailureKind::Timeout => "timeout",
            DispatchFailureKind::TlsError => "tls_error",
            DispatchFailureKind::MalformedResponse => "malformed_response",
            DispatchFailureKind::InvalidTarget => "invalid_target",
        }
    }
}

impl fmt::Display for DispatchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed dispatch to a named backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("dispatch to {service_name} failed ({kind}): {cause}")]
pub struct DispatchFailure {
    pub kind: DispatchFailureKind,
    pub service_name: String,
    /// The owning entry's prefix, reported to clients as `service`.
    pub service_prefix: String,
    /// Human description of the underlying error.
    pub cause: String,
}

impl DispatchFailure {
    pub fn new(
        kind: DispatchFailureKind,
        service_name: impl Into<String>,
        service_prefix: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            service_name: service_name.into(),
            service_prefix: service_prefix.into(),
            cause: cause.into(),
        }
    }
}

/// Classify a client error for a request to `target`.
pub fn classify(
    err: &hyper_util::client::legacy::Error,
    target: &axum::http::Uri,
) -> DispatchFailureKind {
    let https = target.scheme_str() == Some("https");
    classify_chain(err, err.is_connect(), https)
}

/// Classify by walking the source chain, descending into the error wrapped
/// by every `io::Error` (its `source()` skips that layer).
pub fn classify_chain(
    err: &(dyn StdError + 'static),
    is_connect: bool,
    https: bool,
) -> DispatchFailureKind {
    let mut saw_invalid_data = false;
    if let Some(kind) = walk(err, &mut saw_invalid_data) {
        return kind;
    }

    match (is_connect, https && saw_invalid_data) {
        // rustls failures surface as InvalidData from the handshake
        (true, true) => DispatchFailureKind::TlsError,
        (true, false) => DispatchFailureKind::ConnectionRefused,
        (false, _) => DispatchFailureKind::MalformedResponse,
    }
}

fn walk(err: &(dyn StdError + 'static), saw_invalid_data: &mut bool) -> Option<DispatchFailureKind> {
    let mut source = Some(err);

    while let Some(current) = source {
        if current.downcast_ref::<rustls::Error>().is_some() {
            return Some(DispatchFailureKind::TlsError);
        }
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if let Some(inner) = io.get_ref() {
                if let Some(kind) = walk(inner, saw_invalid_data) {
                    return Some(kind);
                }
            }
            match io.kind() {
                std::io::ErrorKind::TimedOut => return Some(DispatchFailureKind::Timeout),
                std::io::ErrorKind::InvalidData => *saw_invalid_data = true,
                _ => {}
            }
        }
        // hyper-util's resolver reports lookups as "dns error"
        if current.to_string().to_lowercase().contains("dns error") {
            return Some(DispatchFailureKind::DnsFailure);
        }
        source = current.source();
    }
    None
}

/// Render an error and its sources as one line.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}
