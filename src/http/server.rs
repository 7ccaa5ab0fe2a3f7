//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with introspection routes and the proxy fallback
//! - Wire up middleware (request ID, tracing, CORS)
//! - Route each request, dispatch it, and relay or map the outcome
//! - Serve on a listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{CorsConfig, GatewayConfig};
use crate::http::introspection::{self, HEALTH_PATH, SERVICES_PATH};
use crate::http::request::{
    client_info, make_request_span, propagate_request_id_layer, request_id,
    set_request_id_layer,
};
use crate::http::response::{relay, ErrorMapper, GatewayError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::{Dispatcher, ForwardedRequest};
use crate::routing::{RouteDecision, Router as ServiceRouter, ServiceRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: ServiceRouter,
    pub dispatcher: Dispatcher,
    pub errors: ErrorMapper,
    pub started_at: Instant,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server over a validated registry.
    ///
    /// Fails only if the outbound TLS client cannot be configured.
    pub fn new(config: GatewayConfig, registry: ServiceRegistry) -> Result<Self, std::io::Error> {
        let state = AppState {
            router: ServiceRouter::new(Arc::new(registry)),
            dispatcher: Dispatcher::new(&config.timeouts)?,
            errors: ErrorMapper::new(config.dev_mode),
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(HEALTH_PATH, get(introspection::health).fallback(proxy_handler))
            .route(SERVICES_PATH, get(introspection::services).fallback(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state);

        if let Some(cors) = cors_layer(&config.cors) {
            router = router.layer(cors);
        }

        router
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream_timeout_secs = self.config.timeouts.upstream_secs,
            dev_mode = self.config.dev_mode,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(&config.allowed_origin) {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!(
                origin = %config.allowed_origin,
                error = %e,
                "Invalid CORS origin, CORS disabled"
            );
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(config.allow_credentials),
    )
}

/// Main proxy handler.
/// Routes the request, forwards it, and relays the backend's answer.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let (entry, remainder) = match state.router.route(&path) {
        RouteDecision::Forward { entry, remainder } => (entry, remainder),
        RouteDecision::NotFound => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start_time);
            return state
                .errors
                .map(&GatewayError::RouteNotFound { path }, None);
        }
    };

    let client = client_info(&request);
    let outcome = match ForwardedRequest::build(entry, &remainder, request, &client) {
        Ok(forwarded) => state.dispatcher.dispatch(entry, forwarded).await,
        Err(failure) => Err(failure),
    };

    match outcome {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(method.as_str(), status.as_u16(), &entry.name, start_time);

            if state.errors.dev_mode() {
                tracing::debug!(
                    request_id = %request_id,
                    "[PROXY RESPONSE] {} {} -> {}",
                    method,
                    path,
                    status.as_u16()
                );
            }
            tracing::info!(
                request_id = %request_id,
                service = %entry.name,
                method = %method,
                path = %path,
                status = status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Proxied request"
            );

            relay(response)
        }
        Err(failure) => {
            tracing::error!(
                request_id = %request_id,
                service = %entry.name,
                method = %method,
                path = %path,
                kind = %failure.kind,
                cause = %failure.cause,
                "Dispatch failed"
            );
            metrics::record_request(method.as_str(), 502, &entry.name, start_time);
            metrics::record_dispatch_failure(&entry.name, failure.kind.as_str());

            state
                .errors
                .map(&GatewayError::Dispatch(failure), Some(entry.description.as_str()))
        }
    }
}
