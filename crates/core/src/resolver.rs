//! Session role resolution.
//!
//! Decides whether a session belongs to a family (client), a validated
//! caregiver (employee), or nobody, and repairs stored role metadata that
//! disagrees with the employee validation table.
//!
//! # Algorithm
//!
//! 1. No session: neither role.
//! 2. Metadata `client`: client, no lookup.
//! 3. Metadata `employee`: look up a validated employee record. Found means
//!    employee. Missing means the hint is stale, so metadata is rewritten to
//!    `client` and the session resolves as a client.
//! 4. Metadata unset: look up a validated employee record and store
//!    `employee` or `client` accordingly, but only while still unset.
//!
//! A failed lookup is an error; callers fall back to
//! [`RoleState::denied`] so a backend outage never grants access.
//! Metadata writes are compare-and-set, so concurrent or repeated
//! resolutions of the same session write at most once.

use thiserror::Error;

use crate::identity::SessionIdentity;
use crate::ports::{EmployeeDirectory, RoleMetadataStore, StoreError};
use crate::types::{ResolvedRole, RoleMetadata, RoleState, UserId};

/// Role resolution failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The employee validation lookup failed.
    #[error("could not verify employee status for user {user_id}: {source}")]
    EmployeeLookup {
        user_id: UserId,
        #[source]
        source: StoreError,
    },
}

/// Outcome of resolving one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub role: ResolvedRole,
    /// Set when the session's cached metadata disagrees with the resolved
    /// role. Holders of a session copy should replace their hint with it.
    pub corrected_metadata: Option<RoleMetadata>,
}

impl Resolution {
    const fn settled(role: ResolvedRole) -> Self {
        Self {
            role,
            corrected_metadata: None,
        }
    }

    const fn corrected(role: ResolvedRole, metadata: RoleMetadata) -> Self {
        Self {
            role,
            corrected_metadata: Some(metadata),
        }
    }

    /// Flags for guards and templates.
    #[must_use]
    pub fn state(&self) -> RoleState {
        RoleState::from(self.role)
    }
}

/// Resolves sessions against an employee directory and a metadata store.
#[derive(Debug, Clone)]
pub struct RoleResolver<D, M> {
    directory: D,
    metadata: M,
}

impl<D, M> RoleResolver<D, M>
where
    D: EmployeeDirectory,
    M: RoleMetadataStore,
{
    #[must_use]
    pub const fn new(directory: D, metadata: M) -> Self {
        Self {
            directory,
            metadata,
        }
    }

    /// Resolve the effective role of `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::EmployeeLookup`] when the employee table cannot
    /// be queried. Failing to write corrected metadata is logged and does not
    /// fail resolution.
    pub async fn resolve(
        &self,
        session: Option<&SessionIdentity>,
    ) -> Result<Resolution, ResolveError> {
        let Some(session) = session else {
            return Ok(Resolution::settled(ResolvedRole::Unauthenticated));
        };
        let user_id = session.user_id;

        match session.role_metadata {
            Some(RoleMetadata::Client) => Ok(Resolution::settled(ResolvedRole::Client)),
            Some(RoleMetadata::Employee) => {
                if self.is_validated_employee(user_id).await? {
                    return Ok(Resolution::settled(ResolvedRole::Employee));
                }

                tracing::info!(
                    user_id = %user_id,
                    "employee metadata without a validated employee record, downgrading to client"
                );
                self.store_metadata(user_id, Some(RoleMetadata::Employee), RoleMetadata::Client)
                    .await;
                Ok(Resolution::corrected(
                    ResolvedRole::Client,
                    RoleMetadata::Client,
                ))
            }
            None => {
                let role = if self.is_validated_employee(user_id).await? {
                    ResolvedRole::Employee
                } else {
                    ResolvedRole::Client
                };
                let metadata = if role.is_employee() {
                    RoleMetadata::Employee
                } else {
                    RoleMetadata::Client
                };

                tracing::info!(user_id = %user_id, role = %metadata, "recording missing role metadata");
                self.store_metadata(user_id, None, metadata).await;
                Ok(Resolution::corrected(role, metadata))
            }
        }
    }

    /// Resolve and collapse failures to [`RoleState::denied`].
    pub async fn role_state(&self, session: Option<&SessionIdentity>) -> RoleState {
        match self.resolve(session).await {
            Ok(resolution) => resolution.state(),
            Err(e) => {
                tracing::error!(error = %e, "role resolution failed, denying access");
                RoleState::denied()
            }
        }
    }

    async fn is_validated_employee(&self, user_id: UserId) -> Result<bool, ResolveError> {
        self.directory
            .find_validated(user_id)
            .await
            .map(|record| record.is_some_and(|r| r.is_validated))
            .map_err(|source| ResolveError::EmployeeLookup { user_id, source })
    }

    async fn store_metadata(
        &self,
        user_id: UserId,
        expected: Option<RoleMetadata>,
        new: RoleMetadata,
    ) {
        match self
            .metadata
            .set_role_metadata(user_id, expected, new)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = %user_id, role = %new, "role metadata already updated");
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    role = %new,
                    error = %e,
                    "failed to store corrected role metadata"
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::identity::EmployeeRecord;
    use crate::types::{Email, EmployeeId};

    // ===== Fakes =====

    #[derive(Default)]
    struct FakeDirectory {
        validated: Vec<UserId>,
        unvalidated: Vec<UserId>,
        fail: bool,
        lookups: AtomicUsize,
    }

    impl FakeDirectory {
        fn with_validated(ids: &[i32]) -> Self {
            Self {
                validated: ids.iter().copied().map(UserId::new).collect(),
                ..Self::default()
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl EmployeeDirectory for FakeDirectory {
        async fn find_validated(
            &self,
            user_id: UserId,
        ) -> Result<Option<EmployeeRecord>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::message("connection refused"));
            }
            if self.unvalidated.contains(&user_id) {
                // A real query filters on is_validated; the fake mirrors that.
                return Ok(None);
            }
            Ok(self.validated.contains(&user_id).then(|| EmployeeRecord {
                id: EmployeeId::new(user_id.as_i32() + 100),
                user_id,
                email: Email::parse("carer@kindred.example").unwrap(),
                is_validated: true,
                last_login: None,
            }))
        }
    }

    #[derive(Default)]
    struct FakeMetadata {
        stored: Mutex<HashMap<UserId, RoleMetadata>>,
        writes: AtomicUsize,
        fail: bool,
    }

    impl FakeMetadata {
        fn seeded(user_id: i32, metadata: RoleMetadata) -> Self {
            let store = Self::default();
            store
                .stored
                .lock()
                .unwrap()
                .insert(UserId::new(user_id), metadata);
            store
        }

        fn get(&self, user_id: i32) -> Option<RoleMetadata> {
            self.stored
                .lock()
                .unwrap()
                .get(&UserId::new(user_id))
                .copied()
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl RoleMetadataStore for FakeMetadata {
        async fn set_role_metadata(
            &self,
            user_id: UserId,
            expected: Option<RoleMetadata>,
            new: RoleMetadata,
        ) -> Result<bool, StoreError> {
            if self.fail {
                return Err(StoreError::message("read-only replica"));
            }
            let mut stored = self.stored.lock().unwrap();
            if stored.get(&user_id).copied() != expected {
                return Ok(false);
            }
            stored.insert(user_id, new);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn session(user_id: i32, metadata: Option<RoleMetadata>) -> SessionIdentity {
        SessionIdentity::new(UserId::new(user_id), metadata)
    }

    // ===== No session =====

    #[tokio::test]
    async fn test_no_session_is_neither_role() {
        let directory = FakeDirectory::default();
        let metadata = FakeMetadata::default();
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver.resolve(None).await.unwrap();

        assert_eq!(resolution.role, ResolvedRole::Unauthenticated);
        assert_eq!(resolution.state(), RoleState::denied());
        assert_eq!(directory.lookups(), 0);
    }

    // ===== Client fast path =====

    #[tokio::test]
    async fn test_client_metadata_is_trusted_without_lookup() {
        // Even a validated employee is treated as a client when the hint says
        // so; the hint is the fast path and is never re-checked.
        let directory = FakeDirectory::with_validated(&[1]);
        let metadata = FakeMetadata::seeded(1, RoleMetadata::Client);
        let resolver = RoleResolver::new(&directory, &metadata);

        for user_id in [1, 2, 3] {
            let state = resolver
                .resolve(Some(&session(user_id, Some(RoleMetadata::Client))))
                .await
                .unwrap()
                .state();
            assert!(state.is_client);
            assert!(!state.is_employee);
        }

        assert_eq!(directory.lookups(), 0);
        assert_eq!(metadata.writes(), 0);
    }

    // ===== Employee metadata =====

    #[tokio::test]
    async fn test_validated_employee_resolves_as_employee() {
        let directory = FakeDirectory::with_validated(&[7]);
        let metadata = FakeMetadata::seeded(7, RoleMetadata::Employee);
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver
            .resolve(Some(&session(7, Some(RoleMetadata::Employee))))
            .await
            .unwrap();

        assert_eq!(resolution.role, ResolvedRole::Employee);
        assert_eq!(resolution.corrected_metadata, None);
        assert_eq!(metadata.writes(), 0);
    }

    #[tokio::test]
    async fn test_unvalidated_employee_is_downgraded_exactly_once() {
        let directory = FakeDirectory {
            unvalidated: vec![UserId::new(9)],
            ..FakeDirectory::default()
        };
        let metadata = FakeMetadata::seeded(9, RoleMetadata::Employee);
        let resolver = RoleResolver::new(&directory, &metadata);
        let stale = session(9, Some(RoleMetadata::Employee));

        let first = resolver.resolve(Some(&stale)).await.unwrap();
        let second = resolver.resolve(Some(&stale)).await.unwrap();

        for resolution in [first, second] {
            assert_eq!(resolution.role, ResolvedRole::Client);
            assert_eq!(resolution.corrected_metadata, Some(RoleMetadata::Client));
            let state = resolution.state();
            assert!(state.is_client && !state.is_employee);
        }
        assert_eq!(metadata.get(9), Some(RoleMetadata::Client));
        assert_eq!(metadata.writes(), 1);
    }

    #[tokio::test]
    async fn test_employee_without_any_record_is_downgraded() {
        let directory = FakeDirectory::default();
        let metadata = FakeMetadata::seeded(4, RoleMetadata::Employee);
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver
            .resolve(Some(&session(4, Some(RoleMetadata::Employee))))
            .await
            .unwrap();

        assert_eq!(resolution.role, ResolvedRole::Client);
        assert_eq!(metadata.get(4), Some(RoleMetadata::Client));
    }

    // ===== Unset metadata =====

    #[tokio::test]
    async fn test_unset_metadata_for_validated_employee_records_employee() {
        let directory = FakeDirectory::with_validated(&[5]);
        let metadata = FakeMetadata::default();
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver.resolve(Some(&session(5, None))).await.unwrap();

        assert_eq!(resolution.role, ResolvedRole::Employee);
        assert_eq!(resolution.corrected_metadata, Some(RoleMetadata::Employee));
        assert_eq!(metadata.get(5), Some(RoleMetadata::Employee));
    }

    #[tokio::test]
    async fn test_unset_metadata_defaults_to_client() {
        let directory = FakeDirectory::default();
        let metadata = FakeMetadata::default();
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver.resolve(Some(&session(6, None))).await.unwrap();

        assert_eq!(resolution.role, ResolvedRole::Client);
        assert_eq!(metadata.get(6), Some(RoleMetadata::Client));
    }

    #[tokio::test]
    async fn test_repeated_resolution_is_idempotent() {
        let directory = FakeDirectory::with_validated(&[8]);
        let metadata = FakeMetadata::default();
        let resolver = RoleResolver::new(&directory, &metadata);
        let unchanged = session(8, None);

        let first = resolver.resolve(Some(&unchanged)).await.unwrap();
        let second = resolver.resolve(Some(&unchanged)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(metadata.writes(), 1);
    }

    #[tokio::test]
    async fn test_unset_write_does_not_clobber_concurrent_value() {
        // Another resolution stored "employee" between our read and write.
        let directory = FakeDirectory::default();
        let metadata = FakeMetadata::seeded(3, RoleMetadata::Employee);
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver.resolve(Some(&session(3, None))).await.unwrap();

        assert_eq!(resolution.role, ResolvedRole::Client);
        assert_eq!(metadata.get(3), Some(RoleMetadata::Employee));
        assert_eq!(metadata.writes(), 0);
    }

    // ===== Failures =====

    #[tokio::test]
    async fn test_lookup_failure_denies_access() {
        let directory = FakeDirectory {
            fail: true,
            ..FakeDirectory::default()
        };
        let metadata = FakeMetadata::default();
        let resolver = RoleResolver::new(&directory, &metadata);
        let pending = session(2, None);

        let err = resolver.resolve(Some(&pending)).await.unwrap_err();
        assert!(matches!(err, ResolveError::EmployeeLookup { user_id, .. } if user_id == UserId::new(2)));

        assert_eq!(resolver.role_state(Some(&pending)).await, RoleState::denied());
        assert_eq!(metadata.writes(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_for_employee_metadata_denies_access() {
        let directory = FakeDirectory {
            fail: true,
            ..FakeDirectory::default()
        };
        let metadata = FakeMetadata::seeded(2, RoleMetadata::Employee);
        let resolver = RoleResolver::new(&directory, &metadata);

        let state = resolver
            .role_state(Some(&session(2, Some(RoleMetadata::Employee))))
            .await;

        assert_eq!(state, RoleState::denied());
        assert_eq!(metadata.get(2), Some(RoleMetadata::Employee));
    }

    #[tokio::test]
    async fn test_metadata_write_failure_still_resolves() {
        let directory = FakeDirectory::with_validated(&[11]);
        let metadata = FakeMetadata {
            fail: true,
            ..FakeMetadata::default()
        };
        let resolver = RoleResolver::new(&directory, &metadata);

        let resolution = resolver.resolve(Some(&session(11, None))).await.unwrap();

        assert_eq!(resolution.role, ResolvedRole::Employee);
        assert_eq!(resolution.corrected_metadata, Some(RoleMetadata::Employee));
    }
}
