//! User repository for database operations.
//!
//! Accounts, password hashes, and the role metadata hint that the role
//! resolver keeps consistent with the employee table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kindred_core::{Email, RoleMetadata, UserId};

use super::RepositoryError;
use crate::models::{ClientProfile, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    role_metadata: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            role_metadata: RoleMetadata::from_stored(row.role_metadata.as_deref()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const USER_COLUMNS: &str = "id, email, role_metadata, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM kindred.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create an account and its profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        role_metadata: Option<RoleMetadata>,
        profile: &ClientProfile,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO kindred.users (email, password_hash, role_metadata)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role_metadata.map(RoleMetadata::as_str))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "email"))?;

        sqlx::query(
            r"
            INSERT INTO kindred.profiles (user_id, full_name, phone, address)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(row.id)
        .bind(&profile.full_name)
        .bind(profile.phone.as_deref())
        .bind(profile.address.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        User::try_from(row)
    }

    /// Get a user together with their password hash, for sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM kindred.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// Read the stored role metadata for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn role_metadata(&self, id: UserId) -> Result<Option<RoleMetadata>, RepositoryError> {
        let stored: Option<Option<String>> =
            sqlx::query_scalar("SELECT role_metadata FROM kindred.users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        stored
            .map(|value| RoleMetadata::from_stored(value.as_deref()))
            .ok_or(RepositoryError::NotFound)
    }

    /// Compare-and-set the role metadata.
    ///
    /// Writes `new` only while the stored value equals `expected` (`None`
    /// meaning NULL). Returns whether a row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_role_metadata(
        &self,
        id: UserId,
        expected: Option<RoleMetadata>,
        new: RoleMetadata,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE kindred.users
            SET role_metadata = $3, updated_at = NOW()
            WHERE id = $1 AND role_metadata IS NOT DISTINCT FROM $2
            ",
        )
        .bind(id)
        .bind(expected.map(RoleMetadata::as_str))
        .bind(new.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
