//! Storefront Sync Core - Shared domain types.
//!
//! This crate provides the types exchanged with the storefront REST API and
//! held in the client-side stores:
//! - `storefront` - Session, cart and order stores plus the HTTP wrapper
//! - `cli` - Command-line views over the stores
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, statuses and the API payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
