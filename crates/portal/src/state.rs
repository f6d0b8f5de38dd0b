//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use kindred_core::ports::{EmployeeDirectory, RoleMetadataStore};

use crate::config::PortalConfig;
use crate::db::PgRoleStore;
use crate::services::{EmailService, RoleService, SessionEvents};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    pool: PgPool,
    events: SessionEvents,
    roles: RoleService,
    email: EmailService,
}

impl AppState {
    /// Create a new application state that resolves roles against the
    /// portal database.
    ///
    /// Starts the role cache listener, so this must run inside a Tokio
    /// runtime.
    #[must_use]
    pub fn new(config: PortalConfig, pool: PgPool) -> Self {
        let store = PgRoleStore::new(pool.clone());
        Self::with_role_store(config, pool, store)
    }

    /// Create application state with roles resolved against `store`.
    #[must_use]
    pub fn with_role_store<S>(config: PortalConfig, pool: PgPool, store: S) -> Self
    where
        S: EmployeeDirectory + RoleMetadataStore + Clone + 'static,
    {
        let events = SessionEvents::new();
        let roles = RoleService::new(store, &events, config.role_cache_ttl);
        let email = EmailService::new(config.contact_inbox.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                events,
                roles,
                email,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Session change emitter.
    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.inner.events
    }

    /// The role authority used by every guard.
    #[must_use]
    pub fn roles(&self) -> &RoleService {
        &self.inner.roles
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }
}
