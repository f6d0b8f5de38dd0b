//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` in production; tests pass any other
//! [`SessionStore`] to [`session_layer`].

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::PortalConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "kindred_session";

/// Sessions end after seven days without a request.
const SESSION_INACTIVITY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The production session layer.
pub type PortalSessionLayer = SessionManagerLayer<PostgresStore>;

/// Build the session layer around `store`.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    config: &PortalConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_INACTIVITY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer with the `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by `kindred migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &PortalConfig,
) -> PortalSessionLayer {
    session_layer(PostgresStore::new(pool.clone()), config)
}
