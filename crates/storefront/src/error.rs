//! Store-level error type.
//!
//! Every store operation returns `Result<T, StoreError>`. Remote failures are
//! additionally mirrored into the store's `error` field; precondition
//! failures are not.

use thiserror::Error;

use crate::api::ApiError;

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No user id in durable storage; no request was sent.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// No cached cart id for an operation that needs one; no request was sent.
    #[error("Cart not found")]
    CartNotFound,

    /// The remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    /// Whether the failure came from a precondition rather than the server.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::CartNotFound)
    }

    /// The underlying API error, if any.
    #[must_use]
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(StoreError::NotAuthenticated.to_string(), "Not authenticated");
        assert_eq!(StoreError::CartNotFound.to_string(), "Cart not found");

        let remote = StoreError::from(ApiError::Rejected("Out of stock".to_string()));
        assert_eq!(remote.to_string(), "Out of stock");
        assert!(!remote.is_precondition());
        assert!(StoreError::CartNotFound.is_precondition());
    }
}
