//! Database operations for the portal `PostgreSQL` database.
//!
//! # Schema: `kindred`
//!
//! ## Tables
//!
//! - `users` - Accounts, password hashes and role metadata
//! - `profiles` - Contact details used to pre-fill bookings
//! - `employees` - Staff validation records (managed from the CLI)
//! - `service_requests` - Bookings and their status
//! - `monthly_packages`, `service_offerings`, `caregivers` - Catalog
//! - `care_reports` - Visit reports written by caregivers
//!
//! Sessions live in `tower_sessions.session`, created by the session store's
//! own migration.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p kindred-cli -- migrate
//! ```

pub mod catalog;
pub mod employees;
pub mod profiles;
pub mod reports;
pub mod role_store;
pub mod service_requests;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use employees::EmployeeRepository;
pub use profiles::ProfileRepository;
pub use reports::ReportRepository;
pub use role_store::PgRoleStore;
pub use service_requests::ServiceRequestRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
