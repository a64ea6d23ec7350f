//! Common test utilities for integration tests
//!
//! Spins up an in-process product catalogue on an ephemeral port.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How long the `/slow` route waits before answering
pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct CatalogueState {
    known_ids: Arc<Vec<u64>>,
    hits: Arc<AtomicUsize>,
}

/// A mock server bound to 127.0.0.1, aborted on drop
pub struct MockServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Number of requests the catalogue has served
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn list_products(State(state): State<CatalogueState>) -> Json<serde_json::Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let products: Vec<_> = state
        .known_ids
        .iter()
        .map(|id| json!({ "id": id, "name": format!("Product {id}") }))
        .collect();
    Json(json!(products))
}

async fn get_product(State(state): State<CatalogueState>, Path(id): Path<u64>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if state.known_ids.contains(&id) {
        Json(json!({ "id": id, "name": format!("Product {id}") })).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Product not found").into_response()
    }
}

async fn create_item(State(state): State<CatalogueState>) -> StatusCode {
    state.hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::CREATED
}

async fn broken(State(state): State<CatalogueState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response()
}

async fn slow(State(state): State<CatalogueState>) -> &'static str {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
    "late"
}

/// Answers 200 only when the request asks for JSON
async fn accept_check(State(state): State<CatalogueState>, headers: HeaderMap) -> StatusCode {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
        Some("application/json") => StatusCode::OK,
        _ => StatusCode::NOT_ACCEPTABLE,
    }
}

/// Create the catalogue router serving the given product ids
pub fn catalogue_app(known_ids: &[u64]) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = CatalogueState {
        known_ids: Arc::new(known_ids.to_vec()),
        hits: hits.clone(),
    };

    let app = Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/items", post(create_item))
        .route("/broken", get(broken))
        .route("/slow", get(slow))
        .route("/accept-check", get(accept_check))
        .with_state(state);

    (app, hits)
}

/// Serve a catalogue with `known_ids` on an ephemeral port
pub async fn spawn_catalogue(known_ids: &[u64]) -> MockServer {
    let (app, hits) = catalogue_app(known_ids);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Mock server has no address");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });

    MockServer {
        base_url: format!("http://{addr}"),
        hits,
        handle,
    }
}

/// A URL on which nothing is listening
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Probe listener has no address");
    drop(listener);
    format!("http://{addr}")
}

/// A raw server that sends a 200 status line announcing `Content-Length: 100`,
/// writes three body bytes and then stalls every connection
pub async fn spawn_stalled_body_server() -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stalled server");
    let addr = listener.local_addr().expect("Stalled server has no address");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nabc")
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
            });
        }
    });

    MockServer {
        base_url: format!("http://{addr}"),
        hits,
        handle,
    }
}
