//! Authentication error types.

use std::fmt;

use thiserror::Error;

use crate::services::validation::FieldErrors;

/// Signup form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignupField {
    FirstName,
    LastName,
    Email,
    Password,
}

impl fmt::Display for SignupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Password => "password",
        })
    }
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password or unknown email).
    #[error("Invalid email or password. Try demo@shophub.com / demo123")]
    InvalidCredentials,

    /// Signup with an email that is already registered.
    #[error("User with this email already exists")]
    UserAlreadyExists,

    /// Operation needs a signed-in user.
    #[error("No user logged in")]
    NotAuthenticated,

    /// Signup form has invalid fields.
    #[error("invalid signup details: {0}")]
    Validation(FieldErrors<SignupField>),
}
