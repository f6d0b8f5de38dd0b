//! Shared fixtures for Kindred Care scenario tests.
//!
//! - [`InMemoryRoles`] implements the resolver's storage ports
//! - [`TestApp`] builds the real portal router around an in-memory session
//!   store and a database pool that never connects, optionally resolving
//!   roles against [`InMemoryRoles`]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::{MemoryStore, SessionStore};

use kindred_core::identity::EmployeeRecord;
use kindred_core::ports::{EmployeeDirectory, RoleMetadataStore, StoreError};
use kindred_core::{Email, EmployeeId, RoleMetadata, UserId};
use kindred_portal::config::PortalConfig;
use kindred_portal::middleware::session::{SESSION_COOKIE_NAME, session_layer};
use kindred_portal::models::{CurrentUser, session_keys};
use kindred_portal::state::AppState;

// =============================================================================
// In-memory role storage
// =============================================================================

#[derive(Default)]
struct RolesInner {
    employees: HashMap<UserId, EmployeeRecord>,
    metadata: HashMap<UserId, RoleMetadata>,
    unreachable: HashSet<UserId>,
}

/// Employee directory and metadata store backed by hash maps.
#[derive(Clone, Default)]
pub struct InMemoryRoles {
    inner: Arc<Mutex<RolesInner>>,
    lookups: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryRoles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut RolesInner) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Add an employee record for `user_id`.
    pub fn add_employee(&self, user_id: UserId, email: &str, is_validated: bool) {
        let record = EmployeeRecord {
            id: EmployeeId::new(user_id.as_i32()),
            user_id,
            email: Email::parse(email).unwrap_or_else(|e| panic!("bad fixture email: {e}")),
            is_validated,
            last_login: None,
        };
        self.with_inner(|inner| inner.employees.insert(user_id, record));
    }

    /// Seed the stored role metadata.
    pub fn set_metadata(&self, user_id: UserId, metadata: RoleMetadata) {
        self.with_inner(|inner| inner.metadata.insert(user_id, metadata));
    }

    /// Make every employee lookup for `user_id` fail.
    pub fn make_unreachable(&self, user_id: UserId) {
        self.with_inner(|inner| inner.unreachable.insert(user_id));
    }

    /// Stored role metadata for `user_id`.
    #[must_use]
    pub fn metadata(&self, user_id: UserId) -> Option<RoleMetadata> {
        self.with_inner(|inner| inner.metadata.get(&user_id).copied())
    }

    /// Number of employee directory queries so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of metadata writes that were applied.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl EmployeeDirectory for InMemoryRoles {
    async fn find_validated(&self, user_id: UserId) -> Result<Option<EmployeeRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.with_inner(|inner| {
            if inner.unreachable.contains(&user_id) {
                return Err(StoreError::message("employee table unavailable"));
            }
            Ok(inner
                .employees
                .get(&user_id)
                .filter(|record| record.is_validated)
                .cloned())
        })
    }
}

impl RoleMetadataStore for InMemoryRoles {
    async fn set_role_metadata(
        &self,
        user_id: UserId,
        expected: Option<RoleMetadata>,
        new: RoleMetadata,
    ) -> Result<bool, StoreError> {
        let written = self.with_inner(|inner| {
            if inner.metadata.get(&user_id).copied() != expected {
                return false;
            }
            inner.metadata.insert(user_id, new);
            true
        });
        if written {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(written)
    }
}

// =============================================================================
// Router fixture
// =============================================================================

/// Configuration with throwaway secrets and an unreachable database.
///
/// # Panics
///
/// Panics if the fixture inbox address fails to parse.
#[must_use]
pub fn test_config() -> PortalConfig {
    PortalConfig {
        database_url: SecretString::from("postgres://kindred@127.0.0.1:9/kindred_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("kT9#vQ2$wL7@pZ4!mN8&rX3*bH6^cJ1%"),
        role_cache_ttl: Duration::from_secs(60),
        contact_inbox: Email::parse("office@kindredcare.example")
            .unwrap_or_else(|e| panic!("bad fixture email: {e}")),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The portal router with an in-memory session store.
pub struct TestApp {
    router: Router,
    sessions: MemoryStore,
}

impl TestApp {
    /// Build the app with roles resolved against the (unreachable) database.
    /// Must be called inside a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be configured.
    #[must_use]
    pub fn new() -> Self {
        Self::build(AppState::new)
    }

    /// Build the app with roles resolved against `roles`.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be configured.
    #[must_use]
    pub fn with_roles(roles: InMemoryRoles) -> Self {
        Self::build(|config, pool| AppState::with_role_store(config, pool, roles))
    }

    fn build(state: impl FnOnce(PortalConfig, PgPool) -> AppState) -> Self {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy("postgres://kindred@127.0.0.1:9/kindred_test")
            .unwrap_or_else(|e| panic!("failed to configure pool: {e}"));
        let sessions = MemoryStore::default();
        let router = kindred_portal::router(state(config.clone(), pool))
            .layer(session_layer(sessions.clone(), &config));

        Self { router, sessions }
    }

    /// Store a signed-in session and return its cookie header value.
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be stored.
    pub async fn sign_in(&self, user: &CurrentUser) -> String {
        let value = serde_json::to_value(user).unwrap_or_else(|e| panic!("{e}"));
        let mut record = Record {
            id: Id::default(),
            data: HashMap::from([(session_keys::CURRENT_USER.to_string(), value)]),
            expiry_date: OffsetDateTime::now_utc() + CookieDuration::hours(1),
        };
        self.sessions
            .create(&mut record)
            .await
            .unwrap_or_else(|e| panic!("failed to store session: {e}"));

        format!("{SESSION_COOKIE_NAME}={}", record.id)
    }

    /// The user stored in the session behind `cookie`, as last saved.
    pub async fn session_user(&self, cookie: &str) -> Option<CurrentUser> {
        let id: Id = cookie
            .strip_prefix(SESSION_COOKIE_NAME)?
            .strip_prefix('=')?
            .parse()
            .ok()?;
        let record = self.sessions.load(&id).await.ok()??;
        let value = record.data.get(session_keys::CURRENT_USER)?.clone();
        serde_json::from_value(value).ok()
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router returns an error, which axum routers never do.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {})
    }

    /// `GET path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap_or_else(|e| panic!("{e}")))
            .await
    }

    /// `POST path` with a URL-encoded form body.
    pub async fn post_form(&self, path: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(path).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(
            builder
                .body(Body::from(body.to_string()))
                .unwrap_or_else(|e| panic!("{e}")),
        )
        .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A signed-in user with the given role hint.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn user(id: i32, email: &str, role_metadata: Option<RoleMetadata>) -> CurrentUser {
    CurrentUser {
        id: UserId::new(id),
        email: Email::parse(email).unwrap_or_else(|e| panic!("bad fixture email: {e}")),
        role_metadata,
    }
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

/// Read a response body as text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("failed to read body: {e}"));
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|e| panic!("body is not UTF-8: {e}"))
}
