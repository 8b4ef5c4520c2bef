//! Unified error handling.
//!
//! Provides an application-level `AppError` that wraps every component
//! error. Front ends (the CLI) return `Result<T, AppError>` and show
//! [`AppError::user_message`] instead of the raw error chain.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::merge::MergeError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Catalog API request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart conflict resolution failed.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Order could not be placed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Something the user referred to does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Message safe to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.to_string(),
            Self::Storage(_) => "Could not access saved session data".to_string(),
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => "That item is not in the catalog".to_string(),
                CatalogError::RateLimited(_) => {
                    "The product catalog is busy, please try again shortly".to_string()
                }
                _ => "The product catalog is unavailable".to_string(),
            },
            Self::Auth(err) => err.to_string(),
            Self::Merge(err) => match err {
                MergeError::NoPendingConflict => "There are no carts to merge".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => err.to_string(),
                CheckoutError::Validation(fields) => {
                    format!("Please fix the following: {fields}")
                }
            },
            Self::NotFound(what) => format!("{what} was not found"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Process exit code for the CLI.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78,
            Self::Storage(_) => 74,
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => 66,
            Self::Catalog(_) => 69,
            Self::Auth(AuthError::InvalidCredentials | AuthError::NotAuthenticated) => 77,
            Self::Auth(_) | Self::Merge(_) | Self::Checkout(_) | Self::BadRequest(_) => 65,
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product 7 in your cart".to_string());
        assert_eq!(err.to_string(), "Not found: Product 7 in your cart");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::from(CatalogError::Status {
            status: 502,
            body: "upstream exploded at line 42".to_string(),
        });
        assert_eq!(err.user_message(), "The product catalog is unavailable");

        let err = AppError::from(StorageError::Unavailable("lock poisoned".to_string()));
        assert!(!err.user_message().contains("poisoned"));

        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(
            err.user_message(),
            "Invalid email or password. Try demo@shophub.com / demo123"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::from(AuthError::NotAuthenticated).exit_code(), 77);
        assert_eq!(AppError::from(CheckoutError::EmptyCart).exit_code(), 65);
        assert_eq!(AppError::NotFound("x".to_string()).exit_code(), 66);
        assert_eq!(
            AppError::from(CatalogError::NotFound("/products/9999".to_string())).exit_code(),
            66
        );
        assert_eq!(AppError::from(CatalogError::RateLimited(2)).exit_code(), 69);
    }
}
