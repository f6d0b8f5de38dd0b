//! Employee validation records.
//!
//! Rows are created and validated from the CLI. The portal only reads them
//! (through the role resolver) and stamps `last_login`.

use sqlx::PgPool;

use kindred_core::identity::EmployeeRecord;
use kindred_core::{Email, UserId};

use super::RepositoryError;

const EMPLOYEE_COLUMNS: &str = "id, user_id, email, is_validated, last_login";

/// Repository for employee records.
pub struct EmployeeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EmployeeRepository<'a> {
    /// Create a new employee repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the validated employee record for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_validated(
        &self,
        user_id: UserId,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, EmployeeRecord>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM kindred.employees
             WHERE user_id = $1 AND is_validated = TRUE"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Create an unvalidated employee record for an existing account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account already has one.
    pub async fn create(
        &self,
        user_id: UserId,
        email: &Email,
    ) -> Result<EmployeeRecord, RepositoryError> {
        sqlx::query_as::<_, EmployeeRecord>(&format!(
            r"
            INSERT INTO kindred.employees (user_id, email)
            VALUES ($1, $2)
            RETURNING {EMPLOYEE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "employee record"))
    }

    /// Grant or revoke validation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record matches the email.
    pub async fn set_validated(
        &self,
        email: &Email,
        validated: bool,
    ) -> Result<EmployeeRecord, RepositoryError> {
        sqlx::query_as::<_, EmployeeRecord>(&format!(
            r"
            UPDATE kindred.employees
            SET is_validated = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(validated)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Record a sign-in. A no-op for accounts without an employee record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_login(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE kindred.employees SET last_login = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// List every employee record, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        let records = sqlx::query_as::<_, EmployeeRecord>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM kindred.employees ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }
}
