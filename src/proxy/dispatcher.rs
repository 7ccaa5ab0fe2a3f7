//! Outbound dispatch to backends.
//!
//! # Responsibilities
//! - Own the shared HTTP(S) client
//! - Send a forwarded request and await the backend's response headers
//! - Enforce the upstream deadline and classify failures
//!
//! # Design Decisions
//! - The deadline covers dispatch start to response headers only; the body
//!   is streamed afterwards without a deadline
//! - Dropping the dispatch future (client went away) drops the outbound
//!   request and its connection
//! - No retries: a failure is reported once and mapped to 502
//! - Failures are returned, not logged; the handler logs them with the request ID

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Response;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::TimeoutConfig;
use crate::proxy::error::{classify, error_chain, DispatchFailure, DispatchFailureKind};
use crate::proxy::request::ForwardedRequest;
use crate::routing::ServiceEntry;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Sends forwarded requests to backends. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    client: HttpsClient,
    upstream_timeout: Duration,
}

impl Dispatcher {
    /// Build the shared client.
    ///
    /// Uses the OS trust store, falling back to the bundled webpki roots.
    pub fn new(timeouts: &TimeoutConfig) -> std::io::Result<Self> {
        let upstream_timeout = Duration::from_secs(timeouts.upstream_secs);

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(
            Duration::from_secs(timeouts.connect_secs).min(upstream_timeout),
        ));

        let roots = match HttpsConnectorBuilder::new()
            .with_provider_and_native_roots(rustls::crypto::ring::default_provider())
        {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "No native CA roots, using bundled webpki roots");
                HttpsConnectorBuilder::new()
                    .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
                    .map_err(std::io::Error::other)?
            }
        };
        let https = roots
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .build(https);

        Ok(Self {
            client,
            upstream_timeout,
        })
    }

    /// Send `forwarded` to `entry`'s backend and return its response head plus streaming body.
    ///
    /// Any backend status, including 4xx/5xx, is a success here.
    pub async fn dispatch(
        &self,
        entry: &ServiceEntry,
        forwarded: ForwardedRequest,
    ) -> Result<Response<Incoming>, DispatchFailure> {
        let start = Instant::now();
        let target = forwarded.uri.clone();
        let request = forwarded.into_request();

        tracing::debug!(
            service = %entry.name,
            method = %request.method(),
            target = %target,
            "Dispatching to backend"
        );

        match tokio::time::timeout(self.upstream_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    service = %entry.name,
                    status = %response.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Backend responded"
                );
                Ok(response)
            }
            Ok(Err(e)) => Err(DispatchFailure::new(
                classify(&e, &target),
                &entry.name,
                &entry.url_prefix,
                error_chain(&e),
            )),
            Err(_) => Err(DispatchFailure::new(
                DispatchFailureKind::Timeout,
                &entry.name,
                &entry.url_prefix,
                format!(
                    "no response from {target} within {:?}",
                    self.upstream_timeout
                ),
            )),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}
