//! Collaborators of the cart store.
//!
//! The store reaches every external system through one of these traits, so a
//! composition root can wire in the HTTP client and file storage while tests
//! use in-memory doubles.

pub mod notifier;
pub mod storage;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, Stock};

use crate::api::ApiError;

pub use notifier::{MemoryNotifier, Notice, NoticeKind, Notifier, TracingNotifier};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

/// Product lookup by ID.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the product record for `id`.
    async fn product(&self, id: ProductId) -> Result<Product, ApiError>;
}

/// Available-quantity lookup by product ID.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Fetch the current stock for `id`. Implementations must not cache.
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError>;
}
