//! RocketShoes Core - Shared cart domain types.
//!
//! This crate provides the types shared by every RocketShoes component:
//! - `cart` - Cart store, API client and durable storage
//! - `cli` - Command-line front-end driving the cart store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, products, stock and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
