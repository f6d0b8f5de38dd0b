//! Storage seams used by the role resolver.
//!
//! The portal implements these against `PostgreSQL`; tests use in-memory
//! fakes.

use std::future::Future;

use thiserror::Error;

use crate::identity::EmployeeRecord;
use crate::types::{RoleMetadata, UserId};

/// A backing store could not answer.
#[derive(Debug, Error)]
#[error("data store error: {0}")]
pub struct StoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    /// Wrap any backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    /// Build an error from a plain message.
    #[must_use]
    pub fn message(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

/// Lookup of validated staff records.
pub trait EmployeeDirectory: Send + Sync {
    /// Find the employee record for `user_id` with `is_validated = true`.
    fn find_validated(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<EmployeeRecord>, StoreError>> + Send;
}

/// Persisted role metadata for accounts.
pub trait RoleMetadataStore: Send + Sync {
    /// Set the role metadata to `new` only if the stored value still equals
    /// `expected` (`None` meaning unset).
    ///
    /// Returns `true` when a write happened.
    fn set_role_metadata(
        &self,
        user_id: UserId,
        expected: Option<RoleMetadata>,
        new: RoleMetadata,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

impl<T: EmployeeDirectory> EmployeeDirectory for &T {
    fn find_validated(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<EmployeeRecord>, StoreError>> + Send {
        (**self).find_validated(user_id)
    }
}

impl<T: RoleMetadataStore> RoleMetadataStore for &T {
    fn set_role_metadata(
        &self,
        user_id: UserId,
        expected: Option<RoleMetadata>,
        new: RoleMetadata,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).set_role_metadata(user_id, expected, new)
    }
}
