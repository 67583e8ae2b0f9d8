//! Login credential types.
//!
//! Type-safe wrapper for the identity the storefront API hands back after a
//! successful login.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use super::id::UserId;

/// Bearer credentials returned by `POST /login`.
///
/// The token is wrapped in a [`SecretString`] so it never shows up in `Debug`
/// output or logs.
#[derive(Clone, Deserialize)]
#[serde(try_from = "WireCredentials")]
pub struct Credentials {
    /// Identifier of the authenticated user.
    pub user_id: UserId,
    /// Opaque bearer token.
    pub token: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCredentials {
    user_id: UserId,
    token: String,
}

/// Error for a login payload that does not identify a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("Login response has an empty user id")]
    EmptyUserId,
    #[error("Login response has an empty token")]
    EmptyToken,
}

impl TryFrom<WireCredentials> for Credentials {
    type Error = CredentialsError;

    fn try_from(wire: WireCredentials) -> Result<Self, Self::Error> {
        if wire.user_id.as_str().is_empty() {
            return Err(CredentialsError::EmptyUserId);
        }
        if wire.token.is_empty() {
            return Err(CredentialsError::EmptyToken);
        }
        Ok(Self::new(wire.user_id, wire.token))
    }
}

impl Credentials {
    /// Create credentials from a user ID and raw token.
    #[must_use]
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: SecretString::from(token.into()),
        }
    }

    /// Expose the bearer token for storage or header injection.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
