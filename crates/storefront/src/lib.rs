//! Storefront session and cart synchronization.
//!
//! Keeps the authentication session and the shopping cart of a storefront
//! client consistent with its REST backend, across network failures and
//! process restarts.
//!
//! # Layers
//!
//! - [`storage`] - durable key-value storage behind a trait
//! - [`api`] - the HTTP chokepoint: bearer injection, 401 eviction, envelope
//!   unwrapping
//! - [`events`] - session-ended notifications between stores
//! - [`stores`] - session, cart and order stores
//! - [`catalog`] - cached product reads
//! - [`Storefront`] - everything wired together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod storage;
pub mod stores;

pub use api::{ApiClient, ApiError};
pub use catalog::Catalog;
pub use config::{ClientConfig, ConfigError};
pub use error::StoreError;
pub use events::{SessionEvent, SessionEvents};
pub use state::Storefront;
pub use storage::{DurableStorage, FileStorage, KeyValueStore, MemoryStorage, StorageError};
pub use stores::{CartState, CartStore, OrderState, OrderStore, SessionState, SessionStore};
