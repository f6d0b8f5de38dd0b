//! Authentication service.
//!
//! Email and password accounts hashed with Argon2id. Sign-up records the role
//! a person asked for as metadata; only the CLI can make someone staff.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use kindred_core::{Email, RoleMetadata};

use crate::db::{EmployeeRepository, RepositoryError, UserRepository};
use crate::models::{ClientProfile, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Everything collected by the sign-up form.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: RoleMetadata,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    employees: EmployeeRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            employees: EmployeeRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account with its profile.
    ///
    /// Caregivers who sign up get an unvalidated employee record; they use
    /// the portal as a client until an administrator validates them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for bad passwords.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        let full_name = registration.full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::MissingField("full name"));
        }

        let email = Email::parse(registration.email)?;

        validate_password(registration.password)?;
        if registration.password != registration.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(registration.password)?;

        let profile = ClientProfile {
            full_name: full_name.to_string(),
            phone: registration
                .phone
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
            address: None,
        };

        let user = self
            .users
            .create_with_password(&email, &password_hash, Some(registration.role), &profile)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        if registration.role == RoleMetadata::Employee {
            self.employees.create(user.id, &user.email).await?;
            tracing::info!(user_id = %user.id, "caregiver sign-up awaiting validation");
        }

        Ok(user)
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if let Err(e) = self.employees.touch_last_login(user.id).await {
            tracing::warn!(user_id = %user.id, error = %e, "failed to record last login");
        }

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let msg = AuthError::Repository(RepositoryError::NotFound).user_message();
        assert!(!msg.contains("database"));
        assert_eq!(
            AuthError::MissingField("full name").user_message(),
            "Please enter your full name."
        );
    }
}
