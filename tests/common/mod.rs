//! Shared utilities for integration testing.
//!
//! Every backend and gateway binds `127.0.0.1:0`, so tests run in parallel.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_gateway::config::{GatewayConfig, TimeoutConfig};
use api_gateway::lifecycle::Shutdown;
use api_gateway::{GatewayServer, ServiceEntry, ServiceRegistry};
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Json;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Notify};

pub fn entry(name: &str, prefix: &str, url: &str, rewrite: &str) -> ServiceEntry {
    ServiceEntry {
        name: name.to_string(),
        url_prefix: prefix.to_string(),
        target_base_url: url.to_string(),
        path_rewrite: rewrite.to_string(),
        description: format!("Servicio {name}"),
    }
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("reqwest client")
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let mut seen = Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        seen.insert(name.to_string(), Value::String(values.join(", ")));
    }

    Json(json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "headers": seen,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Backend that answers every request with a JSON description of what it received:
/// `method`, `uri` (path and query), `headers`, `body`.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Backend that returns a fixed status, body and `x-backend: fixed` header.
pub async fn start_fixed_backend(status_line: &'static str, body: &'static str) -> SocketAddr {
    start_raw_backend(Duration::ZERO, status_line, body).await
}

/// Backend that waits `delay` after reading the request before answering 200.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    start_raw_backend(delay, "200 OK", "late").await
}

async fn start_raw_backend(
    delay: Duration,
    status_line: &'static str,
    body: &'static str,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        tokio::time::sleep(delay).await;

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nx-backend: fixed\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Backend that never answers and reports on the channel when the gateway
/// closes the connection.
pub async fn start_hanging_backend() -> (SocketAddr, mpsc::UnboundedReceiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                let _ = closed_tx.send(());
            });
        }
    });
    (addr, closed_rx)
}

/// Backend that sends a chunked response: `first\n` immediately, then
/// `second\n` only after `release` is notified.
pub async fn start_streaming_backend() -> (SocketAddr, Arc<Notify>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let release = Arc::new(Notify::new());

    let gate = release.clone();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n6\r\nfirst\n\r\n",
                )
                .await;
            gate.notified().await;
            let _ = socket.write_all(b"7\r\nsecond\n\r\n0\r\n\r\n").await;
            let _ = socket.shutdown().await;
        }
    });
    (addr, release)
}

/// Backend that signals `first_seen` as soon as `marker` arrives in the
/// request body, then answers `200 uploaded` once the chunked body ends.
pub async fn start_upload_backend(marker: &'static [u8]) -> (SocketAddr, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut seen_tx = Some(seen_tx);
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => n,
                };
                received.extend_from_slice(&buf[..n]);
                if contains(&received, marker) {
                    if let Some(tx) = seen_tx.take() {
                        let _ = tx.send(());
                    }
                }
                if received.ends_with(b"0\r\n\r\n") {
                    break;
                }
            }
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\nuploaded")
                .await;
            let _ = socket.shutdown().await;
        }
    });
    (addr, seen_rx)
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// An address with nothing listening on it.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn test_config(dev_mode: bool, upstream_secs: u64) -> GatewayConfig {
    GatewayConfig {
        dev_mode,
        timeouts: TimeoutConfig {
            upstream_secs,
            connect_secs: upstream_secs,
        },
        ..GatewayConfig::default()
    }
}

/// Build an in-process gateway over `entries`.
pub fn build_gateway(entries: Vec<ServiceEntry>, config: GatewayConfig) -> GatewayServer {
    let registry = ServiceRegistry::load(entries).expect("valid registry");
    GatewayServer::new(config, registry).expect("gateway server")
}

/// Serve a gateway over `entries` on an ephemeral port.
pub async fn spawn_gateway(
    entries: Vec<ServiceEntry>,
    config: GatewayConfig,
) -> (SocketAddr, Shutdown) {
    let server = build_gateway(entries, config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let serving = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, serving).await;
    });
    (addr, shutdown)
}
