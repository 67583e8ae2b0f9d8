//! Durable client-side storage.
//!
//! The stores never touch a global: they receive a [`DurableStorage`] handle
//! wrapping any [`KeyValueStore`] backend.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - process-local, used in tests and embedded setups
//! - [`FileStorage`] - JSON file, survives process restarts (the CLI's "page reload")
//!
//! # Layout
//!
//! | key | value |
//! |-----|-------|
//! | `token` | raw bearer token, read by the HTTP wrapper |
//! | `userId` | raw user id, read by the cart and order stores |
//! | `auth-storage` | `{"state": {token, userId, isAuthenticated}, "version": 0}` |
//! | `cart-storage` | `{"state": {cartId}, "version": 0}` |

mod file;
mod memory;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use storefront_sync_core::{CartId, Credentials, UserId};
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage keys.
pub mod keys {
    /// Bearer token injected into every request.
    pub const TOKEN: &str = "token";

    /// Current user's ID.
    pub const USER_ID: &str = "userId";

    /// Persisted slice of the session store.
    pub const AUTH_STORAGE: &str = "auth-storage";

    /// Persisted slice of the cart store.
    pub const CART_STORAGE: &str = "cart-storage";
}

/// Version written into persisted slices.
pub const SLICE_VERSION: u32 = 0;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A string key-value store that survives restarts.
///
/// Writes are synchronous; callers rely on a successful `set` being durable
/// before they move on.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Envelope around a persisted store slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub state: T,
    #[serde(default)]
    pub version: u32,
}

/// The subset of session state that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSlice {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// The subset of cart state that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSlice {
    #[serde(default)]
    pub cart_id: Option<CartId>,
}

/// Typed access to durable storage.
///
/// Failures are logged and otherwise swallowed: a storage hiccup must not
/// turn a successful remote call into a failed store operation. Reads that
/// fail behave like missing keys.
#[derive(Clone)]
pub struct DurableStorage {
    backend: Arc<dyn KeyValueStore>,
}

impl DurableStorage {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap an already shared backend.
    #[must_use]
    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// In-memory storage, handy for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    // =========================================================================
    // Top-level credentials
    // =========================================================================

    /// Stored bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(keys::TOKEN).filter(|t| !t.is_empty())
    }

    /// Stored user ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.read(keys::USER_ID)
            .filter(|id| !id.is_empty())
            .map(UserId::from)
    }

    /// Store the token and user ID read by the HTTP wrapper and cart store.
    pub fn set_credentials(&self, credentials: &Credentials) {
        self.write(keys::TOKEN, credentials.token());
        self.write(keys::USER_ID, credentials.user_id.as_str());
    }

    /// Remove the token and user ID.
    pub fn clear_credentials(&self) {
        self.delete(keys::TOKEN);
        self.delete(keys::USER_ID);
    }

    // =========================================================================
    // Store slices
    // =========================================================================

    /// Persisted session slice, or the empty slice.
    #[must_use]
    pub fn session_slice(&self) -> SessionSlice {
        self.read_slice(keys::AUTH_STORAGE)
    }

    /// Persist the session slice.
    pub fn save_session_slice(&self, slice: &SessionSlice) {
        self.write_slice(keys::AUTH_STORAGE, slice);
    }

    /// Persisted cart slice, or the empty slice.
    #[must_use]
    pub fn cart_slice(&self) -> CartSlice {
        self.read_slice(keys::CART_STORAGE)
    }

    /// Persist the cart slice.
    pub fn save_cart_slice(&self, slice: &CartSlice) {
        self.write_slice(keys::CART_STORAGE, slice);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn read_slice<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.read(key) else {
            return T::default();
        };
        match serde_json::from_str::<Persisted<T>>(&raw) {
            Ok(persisted) => persisted.state,
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding unreadable persisted slice");
                T::default()
            }
        }
    }

    fn write_slice<T: Serialize>(&self, key: &str, state: &T) {
        let envelope = Persisted {
            state,
            version: SLICE_VERSION,
        };
        match serde_json::to_string(&envelope) {
            Ok(raw) => self.write(key, &raw),
            Err(e) => tracing::warn!(key, error = %e, "Failed to encode persisted slice"),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.backend.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Storage read failed");
            None
        })
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            tracing::warn!(key, error = %e, "Storage write failed");
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            tracing::warn!(key, error = %e, "Storage delete failed");
        }
    }
}

impl std::fmt::Debug for DurableStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStorage").finish_non_exhaustive()
    }
}
