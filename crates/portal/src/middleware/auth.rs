//! Page guards.
//!
//! Each extractor reads the signed-in user from the session, asks the
//! [`RoleService`](crate::services::RoleService) for their role, and applies
//! [`kindred_core::guard::decide`]. Handlers that take one of these
//! extractors only run once access is granted.
//!
//! ```rust,ignore
//! async fn book_service(RequireClient(user): RequireClient) -> impl IntoResponse {
//!     format!("Booking for {}", user.email)
//! }
//! ```

use std::time::Duration;

use askama::Template;
use axum::{
    extract::FromRequestParts,
    http::{HeaderName, HeaderValue, StatusCode, header::RETRY_AFTER, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use kindred_core::guard::{GuardDecision, GuardInput, RedirectTarget, RequiredRole, decide};
use kindred_core::RoleState;

use crate::models::{CurrentUser, session_keys};
use crate::services::SessionEvent;
use crate::state::AppState;

/// How long a request waits for role resolution before showing the
/// "checking your access" page.
const ROLE_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Seconds before the loading page reloads itself.
const LOADING_REFRESH_SECONDS: &str = "2";

/// Only validated employees reach the handler.
pub struct RequireEmployee(pub CurrentUser);

/// Only clients reach the handler.
pub struct RequireClient(pub CurrentUser);

/// Any signed-in user reaches the handler, along with their resolved role.
pub struct RequireSignedIn {
    pub user: CurrentUser,
    pub role: RoleState,
    /// The employee lookup failed, so `role` is denied rather than settled.
    pub role_unavailable: bool,
}

/// The signed-in user, if any. Never rejects.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Why a guarded page was not served.
#[derive(Debug)]
pub enum GuardRejection {
    /// Send the browser elsewhere (`303 See Other`).
    Redirect(RedirectTarget),
    /// Role resolution has not finished; serve a self-refreshing page.
    Loading,
}

#[derive(Template)]
#[template(path = "loading.html")]
struct LoadingTemplate;

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(target) => Redirect::to(target.path()).into_response(),
            Self::Loading => {
                let body = LoadingTemplate.render().unwrap_or_else(|e| {
                    tracing::error!(error = %e, "failed to render loading page");
                    "Checking your access...".to_string()
                });
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    [
                        (
                            HeaderName::from_static("refresh"),
                            HeaderValue::from_static(LOADING_REFRESH_SECONDS),
                        ),
                        (RETRY_AFTER, HeaderValue::from_static(LOADING_REFRESH_SECONDS)),
                    ],
                    Html(body),
                )
                    .into_response()
            }
        }
    }
}

async fn session_user(parts: &Parts) -> Option<(Session, CurrentUser)> {
    let session = parts.extensions.get::<Session>()?.clone();
    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "failed to read session"))
        .ok()
        .flatten()?;
    Some((session, user))
}

/// A request that passed its guard.
struct Granted {
    user: CurrentUser,
    role: RoleState,
    role_unavailable: bool,
}

/// Resolve the caller's role and decide whether `required` is satisfied.
async fn guard(
    parts: &Parts,
    state: &AppState,
    required: Option<RequiredRole>,
) -> Result<Granted, GuardRejection> {
    let Some((session, mut user)) = session_user(parts).await else {
        return match decide(&GuardInput::new(false, required, RoleState::denied())) {
            GuardDecision::Redirect(target) => Err(GuardRejection::Redirect(target)),
            _ => Err(GuardRejection::Redirect(RedirectTarget::Login)),
        };
    };

    let identity = user.identity();
    let mut role_unavailable = false;
    let role = match tokio::time::timeout(
        ROLE_RESOLUTION_TIMEOUT,
        state.roles().resolve(Some(&identity)),
    )
    .await
    {
        Ok(Ok(resolution)) => {
            if let Some(corrected) = resolution.corrected_metadata
                && user.role_metadata != Some(corrected)
            {
                user.role_metadata = Some(corrected);
                if let Err(e) = set_current_user(&session, &user).await {
                    tracing::warn!(user_id = %user.id, error = %e, "failed to update session role");
                }
                state.events().emit(SessionEvent::MetadataUpdated(user.id));
            }
            resolution.state()
        }
        Ok(Err(e)) => {
            tracing::error!(user_id = %user.id, error = %e, "role resolution failed, denying access");
            role_unavailable = true;
            RoleState::denied()
        }
        Err(_) => {
            tracing::warn!(user_id = %user.id, "role resolution still running");
            RoleState::loading()
        }
    };

    match decide(&GuardInput::new(true, required, role)) {
        GuardDecision::Allow(_) => Ok(Granted {
            user,
            role,
            role_unavailable,
        }),
        GuardDecision::Redirect(target) => {
            tracing::debug!(user_id = %user.id, ?required, to = target.path(), "guard redirect");
            Err(GuardRejection::Redirect(target))
        }
        GuardDecision::Loading => Err(GuardRejection::Loading),
    }
}

impl FromRequestParts<AppState> for RequireEmployee {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let granted = guard(parts, state, Some(RequiredRole::Employee)).await?;
        Ok(Self(granted.user))
    }
}

impl FromRequestParts<AppState> for RequireClient {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let granted = guard(parts, state, Some(RequiredRole::Client)).await?;
        Ok(Self(granted.user))
    }
}

impl FromRequestParts<AppState> for RequireSignedIn {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Granted {
            user,
            role,
            role_unavailable,
        } = guard(parts, state, None).await?;
        Ok(Self {
            user,
            role,
            role_unavailable,
        })
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.map(|(_, user)| user)))
    }
}

/// Store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_rejections_use_see_other() {
        let response = GuardRejection::Redirect(RedirectTarget::Login).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");

        let response = GuardRejection::Redirect(RedirectTarget::Dashboard).into_response();
        assert_eq!(response.headers()["location"], "/dashboard");
    }

    #[test]
    fn test_loading_rejection_refreshes() {
        let response = GuardRejection::Loading.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["refresh"], LOADING_REFRESH_SECONDS);
        assert_eq!(response.headers()[RETRY_AFTER], LOADING_REFRESH_SECONDS);
    }
}
