//! The cart store.
//!
//! [`CartStore`] owns the in-memory cart and keeps the durable copy in step
//! with it. Every mutation builds a complete new [`Cart`], writes it to the
//! durable store, and only then publishes it as the current cart. A failed
//! write leaves the in-memory cart untouched.
//!
//! Mutations take `&mut self`, so only one can be in flight per store. The
//! cart observed after a catalog or stock lookup resolves is therefore the
//! same one the operation started from.
//!
//! Failures never reach the caller. Each failed operation emits exactly one
//! [`Notice`](crate::services::Notice); callers observe only whether the cart
//! changed.

use std::num::NonZeroU32;
use std::sync::Arc;

use rocketshoes_core::{Cart, CartStateError, LineItem, ProductId};
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::error::CartError;
use crate::services::{CartStorage, Catalog, NoticeKind, Notifier, StockService};

/// Request to set a line item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Requested absolute quantity. Zero and negative values are rejected.
    pub amount: i64,
}

/// Collaborators injected into a [`CartStore`].
#[derive(Clone)]
pub struct CartServices {
    pub catalog: Arc<dyn Catalog>,
    pub stock: Arc<dyn StockService>,
    pub storage: Arc<dyn CartStorage>,
    pub notifier: Arc<dyn Notifier>,
}

impl CartServices {
    /// Use one API client for both catalog and stock lookups.
    #[must_use]
    pub fn from_api(
        api: ApiClient,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let api = Arc::new(api);
        Self {
            catalog: api.clone(),
            stock: api,
            storage,
            notifier,
        }
    }
}

/// Shopping cart state container.
pub struct CartStore {
    services: CartServices,
    key: String,
    cart: Cart,
}

impl CartStore {
    /// Open the cart stored under `key`.
    ///
    /// A missing, unreadable or corrupt entry yields an empty cart. This is
    /// logged but not reported to the shopper.
    #[must_use]
    pub fn open(services: CartServices, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = load(services.storage.as_ref(), &key);
        debug!(key = %key, items = cart.len(), "Cart loaded");

        Self {
            services,
            key,
            cart,
        }
    }

    /// Current cart snapshot.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart goes through
    /// [`update_product_amount`](Self::update_product_amount) with its
    /// quantity plus one, so it is subject to the same stock ceiling and
    /// notices. A new product is looked up in the catalog and appended with
    /// a quantity of one.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&mut self, product_id: ProductId) {
        if let Some(item) = self.cart.get(product_id) {
            let amount = i64::from(item.amount.get()) + 1;
            self.update_product_amount(UpdateProductAmount { product_id, amount })
                .await;
            return;
        }

        if let Err(e) = self.try_add_new(product_id).await {
            self.fail(NoticeKind::AddFailed, product_id, &e);
        }
    }

    /// Remove a product's line item.
    ///
    /// Removing a product that is not in the cart is reported, not ignored.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_product(&mut self, product_id: ProductId) {
        let result = self
            .cart
            .without(product_id)
            .map_err(CartError::from)
            .and_then(|next| self.commit(next));

        match result {
            Ok(()) => info!("Product removed from cart"),
            Err(e) => self.fail(NoticeKind::RemoveFailed, product_id, &e),
        }
    }

    /// Set a line item's quantity after checking it against current stock.
    #[instrument(skip(self), fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn update_product_amount(&mut self, request: UpdateProductAmount) {
        if let Err(e) = self.try_update(request).await {
            self.fail(NoticeKind::UpdateFailed, request.product_id, &e);
        }
    }

    async fn try_add_new(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let product = self.services.catalog.product(product_id).await?;
        let next = self.cart.with_item(LineItem::new(product))?;
        self.commit(next)?;
        info!("Product added to cart");
        Ok(())
    }

    async fn try_update(&mut self, request: UpdateProductAmount) -> Result<(), CartError> {
        let UpdateProductAmount { product_id, amount } = request;

        if !self.cart.contains(product_id) {
            return Err(CartStateError::MissingProduct(product_id).into());
        }
        if amount <= 0 {
            return Err(CartError::InvalidAmount { product_id, amount });
        }

        let stock = self.services.stock.stock(product_id).await?;
        if amount > i64::from(stock.available) {
            return Err(CartError::StockExceeded {
                product_id,
                requested: amount,
                available: stock.available,
            });
        }

        let quantity = u32::try_from(amount)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(CartError::InvalidAmount { product_id, amount })?;

        let next = self.cart.with_amount(product_id, quantity)?;
        self.commit(next)?;
        info!(amount, "Product quantity updated");
        Ok(())
    }

    /// Persist `next`, then publish it as the current cart.
    fn commit(&mut self, next: Cart) -> Result<(), CartError> {
        let blob = serde_json::to_string(&next)?;
        self.services.storage.set(&self.key, &blob)?;
        debug!(key = %self.key, items = next.len(), "Cart persisted");
        self.cart = next;
        Ok(())
    }

    fn fail(&self, failed: NoticeKind, product_id: ProductId, err: &CartError) {
        let notice = err.report(failed, product_id);
        self.services.notifier.notify(notice);
    }
}

/// Read the persisted cart, falling back to an empty one.
fn load(storage: &dyn CartStorage, key: &str) -> Cart {
    match storage.get(key) {
        Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
            warn!(key, error = %e, "Discarding unparsable persisted cart");
            Cart::new()
        }),
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(key, error = %e, "Could not read persisted cart");
            Cart::new()
        }
    }
}
