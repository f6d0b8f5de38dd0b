//! Employee record management.
//!
//! A caregiver signs up through the portal like anyone else. Their account
//! only opens the schedule once an operator validates the employee record
//! here.
//!
//! # Usage
//!
//! ```bash
//! kindred employee create -e caregiver@example.com --validated
//! kindred employee validate -e caregiver@example.com
//! kindred employee revoke -e caregiver@example.com
//! kindred employee list
//! ```

use thiserror::Error;

use kindred_core::{Email, EmailError, RoleMetadata};
use kindred_portal::db::{EmployeeRepository, RepositoryError, UserRepository};

use super::{ConnectError, connect};

/// Errors that can occur during employee operations.
#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No account found for {0}. Ask them to sign up first.")]
    UnknownAccount(Email),

    #[error("No employee record for {0}. Create one with `kindred employee create`.")]
    UnknownEmployee(Email),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Create an employee record for an existing account.
///
/// # Errors
///
/// Fails when the account does not exist or already has a record.
pub async fn create(email: &str, validated: bool) -> Result<(), EmployeeError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| EmployeeError::UnknownAccount(email.clone()))?;

    let record = EmployeeRepository::new(&pool).create(user.id, &email).await?;
    tracing::info!(employee_id = %record.id, user_id = %user.id, "Employee record created");

    if validated {
        validate_with(&pool, &email).await?;
    } else {
        tracing::info!("Record is not validated yet. Run `kindred employee validate -e {email}`.");
    }

    Ok(())
}

/// Mark an employee as validated and record the employee role on the account.
///
/// # Errors
///
/// Fails when no employee record exists for `email`.
pub async fn validate(email: &str) -> Result<(), EmployeeError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;
    validate_with(&pool, &email).await
}

async fn validate_with(pool: &sqlx::PgPool, email: &Email) -> Result<(), EmployeeError> {
    let record = EmployeeRepository::new(pool)
        .set_validated(email, true)
        .await
        .map_err(|e| not_found_as(e, email))?;

    let users = UserRepository::new(pool);
    let current = users.role_metadata(record.user_id).await?;
    if current != Some(RoleMetadata::Employee)
        && !users
            .set_role_metadata(record.user_id, current, RoleMetadata::Employee)
            .await?
    {
        tracing::warn!(
            user_id = %record.user_id,
            "Account role changed while validating; it will be corrected at next sign-in"
        );
    }

    tracing::info!(employee_id = %record.id, %email, "Employee validated");
    tracing::info!("They need to sign in again for the schedule to appear.");
    Ok(())
}

/// Withdraw an employee's validation.
///
/// The portal downgrades the account to a client the next time its role is
/// resolved, which is at most one role-cache lifetime away.
///
/// # Errors
///
/// Fails when no employee record exists for `email`.
pub async fn revoke(email: &str) -> Result<(), EmployeeError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let record = EmployeeRepository::new(&pool)
        .set_validated(&email, false)
        .await
        .map_err(|e| not_found_as(e, &email))?;

    tracing::info!(employee_id = %record.id, %email, "Employee validation revoked");
    Ok(())
}

/// Print every employee record.
///
/// # Errors
///
/// Fails when the database is unreachable.
pub async fn list() -> Result<(), EmployeeError> {
    let pool = connect().await?;
    let records = EmployeeRepository::new(&pool).list().await?;

    if records.is_empty() {
        tracing::info!("No employee records");
        return Ok(());
    }

    tracing::info!("{} employee record(s)", records.len());
    for record in records {
        let last_login = record
            .last_login
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());
        tracing::info!(
            "  #{} {} validated={} last_login={}",
            record.id,
            record.email,
            record.is_validated,
            last_login
        );
    }

    Ok(())
}

fn not_found_as(error: RepositoryError, email: &Email) -> EmployeeError {
    match error {
        RepositoryError::NotFound => EmployeeError::UnknownEmployee(email.clone()),
        other => EmployeeError::Repository(other),
    }
}
