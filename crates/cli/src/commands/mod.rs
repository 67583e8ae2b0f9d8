//! Command implementations, one module per view.

pub mod auth;
pub mod cart;
pub mod order;
pub mod products;
pub mod profile;

use std::io::BufRead;

use secrecy::SecretString;
use storefront_sync::{ApiError, ConfigError, StoreError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the server rejected the bearer token.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Unauthorized(_)) | Self::Store(StoreError::Api(ApiError::Unauthorized(_)))
        )
    }
}

/// Use `given`, or read one line from stdin.
pub fn password(given: Option<String>) -> Result<SecretString, CliError> {
    if let Some(password) = given {
        return Ok(SecretString::from(password));
    }

    tracing::info!("Password:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(CliError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(SecretString::from(password))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_detected_through_store_errors() {
        let direct = CliError::Api(ApiError::Unauthorized("jwt expired".to_string()));
        let wrapped = CliError::Store(StoreError::Api(ApiError::Unauthorized(
            "jwt expired".to_string(),
        )));
        assert!(direct.is_unauthorized());
        assert!(wrapped.is_unauthorized());
        assert_eq!(wrapped.to_string(), "jwt expired");
    }

    #[test]
    fn test_other_failures_are_not_unauthorized() {
        assert!(!CliError::Store(StoreError::NotAuthenticated).is_unauthorized());
        assert!(!CliError::Api(ApiError::Rejected("Out of stock".to_string())).is_unauthorized());
        assert!(!CliError::InvalidInput("x".to_string()).is_unauthorized());
    }

    #[test]
    fn test_given_password_is_used_verbatim() {
        use secrecy::ExposeSecret;

        let password = password(Some("Secret1!".to_string())).unwrap();
        assert_eq!(password.expose_secret(), "Secret1!");
    }
}
