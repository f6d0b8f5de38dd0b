//! Authentication route handlers.
//!
//! Sign-in and sign-up store a [`CurrentUser`] in the session and publish a
//! session event so the role cache forgets anything it knew about the user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use kindred_core::RoleMetadata;

use super::{MessageQuery, Nav};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, set_current_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::services::{AuthError, AuthService, Registration, SessionEvent};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// `client` (default) or `employee`.
    #[serde(default)]
    pub role: Option<String>,
}

impl RegisterForm {
    fn role(&self) -> RoleMetadata {
        match self.role.as_deref() {
            Some("employee") => RoleMetadata::Employee,
            _ => RoleMetadata::Client,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub wants_employee: bool,
}

/// Map a login error code from the query string to a message.
fn login_error_message(code: &str) -> String {
    match code {
        "credentials" => "Invalid email or password.",
        "session" => "Your session could not be started. Please try again.",
        "expired" => "Your session has expired. Please sign in again.",
        _ => "Something went wrong. Please try again.",
    }
    .to_string()
}

fn login_success_message(code: &str) -> Option<String> {
    match code {
        "signed_out" => Some("You have been signed out.".to_string()),
        _ => None,
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in users go straight to the dashboard.
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    LoginTemplate {
        nav: Nav::default(),
        error: query.error.as_deref().map(login_error_message),
        success: query.success.as_deref().and_then(login_success_message),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.login_with_password(&form.email, &form.password).await {
        Ok(user) => match start_session(&state, &session, &user).await {
            Ok(()) => Redirect::to("/dashboard").into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to start session");
                Redirect::to("/login?error=session").into_response()
            }
        },
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("sign-in rejected");
            Redirect::to("/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "sign-in failed");
            Redirect::to("/login?error=unavailable").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    RegisterTemplate {
        nav: Nav::default(),
        error: None,
        email: String::new(),
        full_name: String::new(),
        phone: String::new(),
        wants_employee: false,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Successful sign-ups are signed in immediately.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let auth = AuthService::new(state.pool());
    let registration = Registration {
        email: &form.email,
        password: &form.password,
        password_confirm: &form.password_confirm,
        full_name: &form.full_name,
        phone: form.phone.as_deref(),
        role: form.role(),
    };

    let error = match auth.register(registration).await {
        Ok(user) => match start_session(&state, &session, &user).await {
            Ok(()) => return Redirect::to("/dashboard").into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to start session after sign-up");
                return Redirect::to("/login?error=session").into_response();
            }
        },
        Err(e) => e,
    };

    let status = match &error {
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::Repository(_) | AuthError::PasswordHash => {
            tracing::error!(error = %error, "sign-up failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };

    (
        status,
        RegisterTemplate {
            nav: Nav::default(),
            error: Some(error.user_message()),
            email: form.email.trim().to_string(),
            full_name: form.full_name.trim().to_string(),
            phone: form.phone.clone().unwrap_or_default(),
            wants_employee: form.role() == RoleMetadata::Employee,
        },
    )
        .into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out and return to the sign-in page.
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    let user: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "failed to flush session");
    }
    clear_sentry_user();

    if let Some(user) = user {
        state.events().emit(SessionEvent::SignedOut(user.id));
        tracing::info!(user_id = %user.id, "signed out");
    }

    Redirect::to("/login?success=signed_out").into_response()
}

/// Rotate the session ID, store the user, and announce the sign-in.
async fn start_session(
    state: &AppState,
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    set_current_user(session, &CurrentUser::from(user)).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    state.events().emit(SessionEvent::SignedIn(user.id));
    tracing::info!(user_id = %user.id, "signed in");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_messages() {
        assert_eq!(login_error_message("credentials"), "Invalid email or password.");
        assert!(login_error_message("<script>").starts_with("Something went wrong"));
    }

    #[test]
    fn test_register_form_role_defaults_to_client() {
        let form = RegisterForm {
            email: "a@b.co".to_string(),
            password: String::new(),
            password_confirm: String::new(),
            full_name: String::new(),
            phone: None,
            role: Some("admin".to_string()),
        };
        assert_eq!(form.role(), RoleMetadata::Client);
    }
}
