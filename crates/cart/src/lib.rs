//! RocketShoes cart library.
//!
//! Holds the shopper's cart, checks quantity changes against the stock
//! service, and mirrors the cart into client-local durable storage after
//! every successful change.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use rocketshoes_cart::api::ApiClient;
//! use rocketshoes_cart::services::{FileStorage, TracingNotifier};
//! use rocketshoes_cart::store::{CartServices, CartStore, UpdateProductAmount};
//!
//! let api = ApiClient::new(&config.api)?;
//! let services = CartServices::from_api(
//!     api,
//!     Arc::new(FileStorage::new(&config.storage_path)),
//!     Arc::new(TracingNotifier),
//! );
//!
//! let mut store = CartStore::open(services, &config.storage_key);
//! store.add_product(ProductId::new(1)).await;
//! store
//!     .update_product_amount(UpdateProductAmount { product_id: ProductId::new(1), amount: 3 })
//!     .await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use store::{CartServices, CartStore, UpdateProductAmount};
