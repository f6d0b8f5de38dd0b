//! `PostgreSQL` implementation of the role resolver's storage ports.

use sqlx::PgPool;

use kindred_core::identity::EmployeeRecord;
use kindred_core::ports::{EmployeeDirectory, RoleMetadataStore, StoreError};
use kindred_core::{RoleMetadata, UserId};

use super::{EmployeeRepository, UserRepository};

/// Employee lookups and metadata writes backed by the portal database.
#[derive(Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EmployeeDirectory for PgRoleStore {
    async fn find_validated(&self, user_id: UserId) -> Result<Option<EmployeeRecord>, StoreError> {
        EmployeeRepository::new(&self.pool)
            .find_validated(user_id)
            .await
            .map_err(StoreError::backend)
    }
}

impl RoleMetadataStore for PgRoleStore {
    async fn set_role_metadata(
        &self,
        user_id: UserId,
        expected: Option<RoleMetadata>,
        new: RoleMetadata,
    ) -> Result<bool, StoreError> {
        UserRepository::new(&self.pool)
            .set_role_metadata(user_id, expected, new)
            .await
            .map_err(StoreError::backend)
    }
}
