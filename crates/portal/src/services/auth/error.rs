//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] kindred_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A required registration field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message safe to show on the login and registration forms.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(e) => format!("Please check your email address: {e}."),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::UserAlreadyExists => {
                "An account with this email already exists. Try signing in instead.".to_string()
            }
            Self::WeakPassword(reason) => format!("Please choose a stronger password: {reason}."),
            Self::PasswordMismatch => "Passwords do not match.".to_string(),
            Self::MissingField(field) => format!("Please enter your {field}."),
            Self::Repository(_) | Self::PasswordHash => {
                "We couldn't complete that right now. Please try again in a moment.".to_string()
            }
        }
    }
}
