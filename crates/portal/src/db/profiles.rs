//! Contact details attached to an account.

use sqlx::PgPool;

use kindred_core::UserId;

use super::RepositoryError;
use crate::models::ClientProfile;

/// Repository for profile rows.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    full_name: String,
    phone: Option<String>,
    address: Option<String>,
}

impl From<ProfileRow> for ClientProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            full_name: row.full_name,
            phone: row.phone,
            address: row.address,
        }
    }
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the profile for a user, if one was saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<ClientProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT full_name, phone, address FROM kindred.profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ClientProfile::from))
    }

    /// Insert or replace the profile for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        profile: &ClientProfile,
    ) -> Result<ClientProfile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO kindred.profiles (user_id, full_name, phone, address)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                updated_at = NOW()
            RETURNING full_name, phone, address
            ",
        )
        .bind(user_id)
        .bind(&profile.full_name)
        .bind(profile.phone.as_deref())
        .bind(profile.address.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
