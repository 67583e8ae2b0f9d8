//! Client-side stores kept in sync with the REST backend.
//!
//! Each store owns a snapshot behind a short synchronous lock that is never
//! held across an `.await`. Operations call the API, then replace the
//! relevant part of the snapshot with the response; nothing is applied
//! optimistically.

pub mod cart;
pub mod orders;
pub mod session;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

pub use cart::{CartState, CartStore};
pub use orders::{OrderState, OrderStore};
pub use session::{SessionState, SessionStore};

/// Shared, lock-guarded snapshot.
#[derive(Debug)]
pub(crate) struct Snapshot<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Snapshot<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub(crate) fn get(&self) -> T {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Optional one-at-a-time guard for store mutations.
///
/// Disabled by default: concurrent mutations race and the last response
/// wins. When enabled, each mutation waits for the previous one to finish.
#[derive(Debug, Clone, Default)]
pub(crate) struct MutationGate {
    lock: Option<Arc<Mutex<()>>>,
}

impl MutationGate {
    pub(crate) fn new(sequential: bool) -> Self {
        Self {
            lock: sequential.then(|| Arc::new(Mutex::new(()))),
        }
    }

    pub(crate) async fn enter(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.lock {
            Some(lock) => Some(Arc::clone(lock).lock_owned().await),
            None => None,
        }
    }
}
