//! HTTP client for the catalog and stock API.
//!
//! # Endpoints
//!
//! - `GET {base_url}/products/{id}` - product record
//! - `GET {base_url}/stock/{id}` - `{ "id": .., "amount": .. }`
//!
//! Product records are cached in memory via `moka` (5 minute TTL by
//! default). Stock is always fetched fresh. No timeout or retry policy is
//! applied: a failed request is reported once and left to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.get_product(ProductId::new(1)).await?;
//! let stock = client.get_stock(product.id).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{Product, ProductId, Stock};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;
use crate::services::{Catalog, StockService};

const MAX_CACHED_PRODUCTS: u64 = 1000;
const ERROR_BODY_PREVIEW: usize = 200;

/// Errors that can occur when talking to the catalog and stock API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API returned a record for a different product.
    #[error("Requested product {requested} but received {received}")]
    UnexpectedRecord {
        requested: ProductId,
        received: ProductId,
    },

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Client construction failed.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the catalog and stock API.
///
/// Cheap to clone; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Option<Cache<ProductId, Product>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = config.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Config(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let products = config.catalog_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PRODUCTS)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// Fetch a product record, serving from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown products, or the underlying HTTP/parse
    /// error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Product cache hit");
            return Ok(product);
        }

        let product: Product = self.get_json(&format!("products/{id}")).await?;
        if product.id != id {
            return Err(ApiError::UnexpectedRecord {
                requested: id,
                received: product.id,
            });
        }

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }

        Ok(product)
    }

    /// Fetch the current stock for a product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown products, or the underlying HTTP/parse
    /// error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let stock: Stock = self.get_json(&format!("stock/{id}")).await?;
        if stock.product_id != id {
            return Err(ApiError::UnexpectedRecord {
                requested: id,
                received: stock.product_id,
            });
        }

        debug!(available = stock.available, "Fetched stock");
        Ok(stock)
    }

    /// GET a JSON document relative to the base URL.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.inner.base_url.join(path)?;

        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = body.chars().take(ERROR_BODY_PREVIEW).collect::<String>();
            tracing::error!(
                status = %status,
                url = %url,
                body = %message,
                "API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl Catalog for ApiClient {
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get_product(id).await
    }
}

#[async_trait]
impl StockService for ApiClient {
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        self.get_stock(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("products/7".to_string());
        assert_eq!(err.to_string(), "Not found: products/7");

        let err = ApiError::Status {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - down");

        let err = ApiError::UnexpectedRecord {
            requested: ProductId::new(1),
            received: ProductId::new(2),
        };
        assert_eq!(err.to_string(), "Requested product 1 but received 2");
    }

    #[test]
    fn test_client_rejects_token_with_newline() {
        let mut config = ApiConfig::new(Url::parse("http://localhost:3333/").unwrap());
        config.token = Some(secrecy::SecretString::from("abc\ndef"));

        let err = ApiClient::new(&config).err().unwrap();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_client_without_cache() {
        let mut config = ApiConfig::new(Url::parse("http://localhost:3333/").unwrap());
        config.catalog_cache_ttl = None;

        let client = ApiClient::new(&config).unwrap();
        assert!(client.inner.products.is_none());
    }
}
