//! Integration test support for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: [`MockApi`] serves the catalog and stock
//! endpoints from memory on an ephemeral local port.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

#[derive(Default)]
struct MockData {
    products: HashMap<i32, Value>,
    stock: HashMap<i32, u32>,
    stock_down: bool,
    product_requests: usize,
    stock_requests: usize,
    last_authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    data: Arc<Mutex<MockData>>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory catalog and stock API bound to `127.0.0.1`.
///
/// The server task is aborted when the value is dropped.
pub struct MockApi {
    state: MockState,
    base_url: Url,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Start the mock server on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = MockState::default();

        let app = Router::new()
            .route("/products/{id}", get(get_product))
            .route("/stock/{id}", get(get_stock))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            state,
            base_url,
            server,
        })
    }

    /// Base URL to point the cart's API client at.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Register a product record (must carry an integer `id`) and its stock.
    ///
    /// # Panics
    ///
    /// Panics if the record has no integer `id` field.
    #[allow(clippy::expect_used)]
    pub fn add_product(&self, record: Value, stock: u32) {
        let id = record
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .expect("product record needs an integer id");

        let mut data = self.state.lock();
        data.products.insert(id, record);
        data.stock.insert(id, stock);
    }

    /// Change the available quantity of a product.
    pub fn set_stock(&self, id: i32, available: u32) {
        self.state.lock().stock.insert(id, available);
    }

    /// Make the stock endpoint answer 503 for every request.
    pub fn set_stock_down(&self, down: bool) {
        self.state.lock().stock_down = down;
    }

    /// Number of product requests served so far.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.lock().product_requests
    }

    /// Number of stock requests served so far.
    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.state.lock().stock_requests
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        self.state.lock().last_authorization.clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn record_authorization(data: &mut MockData, headers: &HeaderMap) {
    data.last_authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
}

async fn get_product(
    State(state): State<MockState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let mut data = state.lock();
    data.product_requests += 1;
    record_authorization(&mut data, &headers);

    match data.products.get(&id) {
        Some(record) => Json(record.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_stock(
    State(state): State<MockState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let mut data = state.lock();
    data.stock_requests += 1;
    record_authorization(&mut data, &headers);

    if data.stock_down {
        return (StatusCode::SERVICE_UNAVAILABLE, "stock service unavailable").into_response();
    }

    match data.stock.get(&id) {
        Some(&amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
