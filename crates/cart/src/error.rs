//! Cart operation errors and how they are reported.
//!
//! Public cart operations never return these errors. Each one is turned into
//! a single user-facing [`Notice`] by [`CartError::report`]; upstream and
//! storage failures are also captured to Sentry before the notice goes out.

use rocketshoes_core::{CartStateError, ProductId};
use thiserror::Error;

use crate::api::ApiError;
use crate::services::{Notice, NoticeKind, StorageError};

/// Why a cart operation failed.
#[derive(Debug, Error)]
pub enum CartError {
    /// The change does not fit the current cart, e.g. the product has no
    /// line item.
    #[error(transparent)]
    State(#[from] CartStateError),

    /// More units requested than the stock service reports.
    #[error("Requested {requested} units of product {product_id}, only {available} available")]
    StockExceeded {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    /// Requested quantity is zero or negative.
    #[error("Invalid amount {amount} for product {product_id}")]
    InvalidAmount { product_id: ProductId, amount: i64 },

    /// Catalog or stock lookup failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),

    /// Durable store write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CartError {
    /// Failures of a collaborator rather than of the shopper's request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Upstream(_) | Self::Storage(_) | Self::Serialize(_)
        )
    }

    /// The notice shown for this error when it ends operation `failed`.
    ///
    /// Stock rejections always read as out-of-stock, whichever operation
    /// triggered them.
    #[must_use]
    pub const fn notice(&self, failed: NoticeKind, product_id: ProductId) -> Notice {
        let kind = match self {
            Self::StockExceeded { .. } | Self::InvalidAmount { .. } => NoticeKind::OutOfStock,
            _ => failed,
        };
        Notice::new(kind, product_id)
    }

    /// Log the error, capturing internal failures to Sentry, and build the
    /// notice for it.
    #[must_use]
    pub fn report(&self, failed: NoticeKind, product_id: ProductId) -> Notice {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                product_id = %product_id,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::warn!(error = %self, product_id = %product_id, "Cart operation rejected");
        }

        self.notice(failed, product_id)
    }
}
