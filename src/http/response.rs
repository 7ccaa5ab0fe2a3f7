//! Client-facing responses.
//!
//! # Responsibilities
//! - Relay a backend response verbatim (minus hop-by-hop headers)
//! - Map gateway-origin failures to the stable JSON error envelope
//!
//! # Design Decisions
//! - Backend 4xx/5xx are relayed, never mapped
//! - Every dispatch failure is 502 BAD_GATEWAY; no route is 404 NOT_FOUND
//! - Mapping is a pure function and cannot fail
//! - `details` (the underlying cause) only appears in development mode

use axum::body::Body;
use axum::http::{Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use hyper::body::Incoming;
use serde::Serialize;

use crate::http::introspection::SERVICES_PATH;
use crate::proxy::headers::strip_hop_by_hop;
use crate::proxy::DispatchFailure;

/// Failures produced by the gateway itself.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no route for {path}")]
    RouteNotFound { path: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchFailure),
}

#[derive(Debug, Serialize)]
struct BadGatewayBody {
    error: &'static str,
    message: String,
    service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, Serialize)]
struct NotFoundBody {
    error: &'static str,
    message: &'static str,
    path: String,
    hint: String,
}

/// Turns [`GatewayError`]s into JSON responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper {
    dev_mode: bool,
}

impl ErrorMapper {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Map an error to its client response.
    ///
    /// `description` names the backend in the 502 message when known.
    pub fn map(&self, err: &GatewayError, description: Option<&str>) -> Response {
        match err {
            GatewayError::RouteNotFound { path } => (
                StatusCode::NOT_FOUND,
                Json(NotFoundBody {
                    error: "NOT_FOUND",
                    message: "Ruta no encontrada",
                    path: path.clone(),
                    hint: format!("Visita {SERVICES_PATH} para ver los servicios disponibles"),
                }),
            )
                .into_response(),
            GatewayError::Dispatch(failure) => {
                let target = description
                    .filter(|d| !d.is_empty())
                    .unwrap_or(failure.service_name.as_str());
                (
                    StatusCode::BAD_GATEWAY,
                    Json(BadGatewayBody {
                        error: "BAD_GATEWAY",
                        message: format!("Error al conectar con {target}"),
                        service: failure.service_prefix.clone(),
                        details: self.dev_mode.then(|| failure.cause.clone()),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Relay a backend response: same status, headers minus hop-by-hop, streamed body.
pub fn relay(response: HttpResponse<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
