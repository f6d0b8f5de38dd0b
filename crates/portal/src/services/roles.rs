//! The portal's single role authority.
//!
//! Wraps the core [`RoleResolver`] with a short-lived cache. Concurrent
//! requests for the same session share one resolution, and session events
//! evict a user's entries as soon as they sign in, sign out, or have their
//! metadata rewritten.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::task::JoinHandle;

use kindred_core::identity::SessionIdentity;
use kindred_core::ports::{EmployeeDirectory, RoleMetadataStore};
use kindred_core::resolver::{ResolveError, Resolution, RoleResolver};
use kindred_core::{ResolvedRole, RoleMetadata, RoleState, UserId};

use super::session_events::{Received, SessionEvents, SessionSubscription};

/// Resolutions depend on the session's metadata hint as well as the user.
type CacheKey = (UserId, Option<RoleMetadata>);

const HINTS: [Option<RoleMetadata>; 3] = [
    None,
    Some(RoleMetadata::Client),
    Some(RoleMetadata::Employee),
];

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A [`RoleResolver`] with its store types erased.
trait SessionResolver: Send + Sync {
    fn resolve_session<'a>(
        &'a self,
        session: &'a SessionIdentity,
    ) -> BoxFuture<'a, Result<Resolution, ResolveError>>;
}

impl<D, M> SessionResolver for RoleResolver<D, M>
where
    D: EmployeeDirectory,
    M: RoleMetadataStore,
{
    fn resolve_session<'a>(
        &'a self,
        session: &'a SessionIdentity,
    ) -> BoxFuture<'a, Result<Resolution, ResolveError>> {
        Box::pin(self.resolve(Some(session)))
    }
}

/// Cached role resolution shared by every request.
#[derive(Clone)]
pub struct RoleService {
    inner: Arc<RoleServiceInner>,
}

struct RoleServiceInner {
    resolver: Box<dyn SessionResolver>,
    cache: Cache<CacheKey, Resolution>,
    listener: JoinHandle<()>,
}

impl Drop for RoleServiceInner {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl RoleService {
    /// Build the service over `store` and start its invalidation listener.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new<S>(store: S, events: &SessionEvents, ttl: Duration) -> Self
    where
        S: EmployeeDirectory + RoleMetadataStore + Clone + 'static,
    {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();

        let listener = tokio::spawn(listen(events.subscribe(), cache.clone()));

        Self {
            inner: Arc::new(RoleServiceInner {
                resolver: Box::new(RoleResolver::new(store.clone(), store)),
                cache,
                listener,
            }),
        }
    }

    /// Resolve a session, reusing a recent answer when there is one.
    ///
    /// # Errors
    ///
    /// Returns the lookup error when the employee table is unreachable.
    /// Failures are not cached.
    pub async fn resolve(
        &self,
        session: Option<&SessionIdentity>,
    ) -> Result<Resolution, Arc<ResolveError>> {
        let Some(session) = session else {
            return Ok(Resolution {
                role: ResolvedRole::Unauthenticated,
                corrected_metadata: None,
            });
        };

        let key = (session.user_id, session.role_metadata);
        self.inner
            .cache
            .try_get_with(key, self.inner.resolver.resolve_session(session))
            .await
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

    #[cfg(test)]
    fn is_cached(&self, user_id: UserId, hint: Option<RoleMetadata>) -> bool {
        self.inner.cache.contains_key(&(user_id, hint))
    }
}

async fn invalidate_user(cache: &Cache<CacheKey, Resolution>, user_id: UserId) {
    for hint in HINTS {
        cache.invalidate(&(user_id, hint)).await;
    }
}

async fn listen(mut subscription: SessionSubscription, cache: Cache<CacheKey, Resolution>) {
    while let Some(received) = subscription.recv().await {
        match received {
            Received::Event(event) => invalidate_user(&cache, event.user_id()).await,
            Received::Lagged(skipped) => {
                tracing::warn!(skipped, "role cache listener lagged, clearing cache");
                cache.invalidate_all();
            }
        }
    }
    tracing::debug!("session event channel closed, role cache listener stopping");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use kindred_core::identity::EmployeeRecord;
    use kindred_core::ports::StoreError;
    use kindred_core::{Email, EmployeeId};

    use super::*;
    use crate::services::session_events::SessionEvent;

    #[derive(Clone, Default)]
    struct FakeStore {
        validated: Arc<HashSet<i32>>,
        lookups: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    impl FakeStore {
        fn with_employee(id: i32) -> Self {
            Self {
                validated: Arc::new(HashSet::from([id])),
                ..Self::default()
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl EmployeeDirectory for FakeStore {
        async fn find_validated(
            &self,
            user_id: UserId,
        ) -> Result<Option<EmployeeRecord>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::message("connection refused"));
            }
            Ok(self
                .validated
                .contains(&user_id.as_i32())
                .then(|| EmployeeRecord {
                    id: EmployeeId::new(1),
                    user_id,
                    email: Email::parse("carer@kindred.example").unwrap(),
                    is_validated: true,
                    last_login: None,
                }))
        }
    }

    impl RoleMetadataStore for FakeStore {
        async fn set_role_metadata(
            &self,
            _user_id: UserId,
            _expected: Option<RoleMetadata>,
            _new: RoleMetadata,
        ) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    fn session(id: i32, hint: Option<RoleMetadata>) -> SessionIdentity {
        SessionIdentity::new(UserId::new(id), hint)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_no_session_is_unauthenticated() {
        let store = FakeStore::default();
        let service = RoleService::new(store.clone(), &SessionEvents::new(), Duration::from_secs(60));

        let state = service.role_state(None).await;
        assert!(!state.is_client && !state.is_employee && !state.is_loading);
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_resolutions_are_cached() {
        let store = FakeStore::with_employee(7);
        let service = RoleService::new(store.clone(), &SessionEvents::new(), Duration::from_secs(60));
        let s = session(7, Some(RoleMetadata::Employee));

        for _ in 0..3 {
            let resolution = service.resolve(Some(&s)).await.unwrap();
            assert_eq!(resolution.role, ResolvedRole::Employee);
        }
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolutions_share_one_lookup() {
        let store = FakeStore::with_employee(7);
        let service = RoleService::new(store.clone(), &SessionEvents::new(), Duration::from_secs(60));
        let s = session(7, None);

        let (a, b) = tokio::join!(service.resolve(Some(&s)), service.resolve(Some(&s)));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_session_event_evicts_user() {
        let store = FakeStore::with_employee(7);
        let events = SessionEvents::new();
        let service = RoleService::new(store.clone(), &events, Duration::from_secs(60));
        let s = session(7, Some(RoleMetadata::Employee));

        service.resolve(Some(&s)).await.unwrap();
        assert!(service.is_cached(UserId::new(7), Some(RoleMetadata::Employee)));

        events.emit(SessionEvent::SignedOut(UserId::new(7)));
        wait_until(|| !service.is_cached(UserId::new(7), Some(RoleMetadata::Employee))).await;

        service.resolve(Some(&s)).await.unwrap();
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let store = FakeStore::with_employee(7);
        store.failing.store(true, Ordering::SeqCst);
        let service = RoleService::new(store.clone(), &SessionEvents::new(), Duration::from_secs(60));
        let s = session(7, Some(RoleMetadata::Employee));

        assert_eq!(service.role_state(Some(&s)).await, RoleState::denied());

        store.failing.store(false, Ordering::SeqCst);
        let state = service.role_state(Some(&s)).await;
        assert!(state.is_employee);
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn test_dropping_service_stops_listener() {
        let events = SessionEvents::new();
        let service = RoleService::new(FakeStore::default(), &events, Duration::from_secs(60));
        assert_eq!(events.subscriber_count(), 1);

        drop(service);
        wait_until(|| events.subscriber_count() == 0).await;
    }
}
