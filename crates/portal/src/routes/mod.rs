//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! GET  /                          - Home page
//! GET  /pricing                   - Hourly rates and package overview
//! GET  /packages                  - Monthly packages by care category
//! GET  /caregivers                - Caregiver profiles and team stats
//! GET  /payment                   - How to pay for a package
//! GET  /contact                   - Contact form
//! POST /contact                   - Send contact message
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database ping)
//!
//! # Auth
//! GET  /login                     - Sign-in page
//! POST /login                     - Sign in (rate limited)
//! GET  /register                  - Sign-up page
//! POST /register                  - Create account (rate limited)
//! POST /logout                    - Sign out
//!
//! # Any signed-in user
//! GET  /dashboard                 - Landing page after sign-in
//! GET  /account                   - Profile
//! POST /account                   - Update profile
//! GET  /chat                      - Office chat (kept in the session)
//! POST /chat                      - Send a chat message
//!
//! # Clients
//! GET  /book-service              - Booking form
//! POST /book-service              - Submit booking
//! GET  /my-requests               - Own service requests
//!
//! # Employees
//! GET  /schedule                  - Open visits
//! POST /schedule/{id}/complete    - Mark a visit completed
//! GET  /reports                   - Care reports
//! POST /reports                   - File a care report
//! ```

pub mod account;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod chat;
pub mod contact;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod reports;
pub mod requests;
pub mod schedule;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use kindred_core::RoleState;

use crate::middleware::auth_rate_limiter;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Navigation shown in the page header.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub is_client: bool,
    pub is_employee: bool,
}

impl Nav {
    /// Header for public pages. Role links appear once the dashboard has
    /// resolved the role.
    #[must_use]
    pub const fn public(user: Option<&CurrentUser>) -> Self {
        Self {
            signed_in: user.is_some(),
            is_client: false,
            is_employee: false,
        }
    }

    #[must_use]
    pub const fn for_role(role: RoleState) -> Self {
        Self {
            signed_in: true,
            is_client: role.is_client,
            is_employee: role.is_employee,
        }
    }

    #[must_use]
    pub const fn client() -> Self {
        Self {
            signed_in: true,
            is_client: true,
            is_employee: false,
        }
    }

    #[must_use]
    pub const fn employee() -> Self {
        Self {
            signed_in: true,
            is_client: false,
            is_employee: true,
        }
    }
}

/// Upper-case the first letter of an error message for display.
pub(crate) fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Marketing and catalog pages.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/pricing", get(catalog::pricing))
        .route("/packages", get(catalog::packages))
        .route("/caregivers", get(catalog::caregivers))
        .route("/payment", get(catalog::payment))
        .route("/contact", get(contact::contact_page).post(contact::send))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Sign-in, sign-up and sign-out.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(auth_rate_limiter())
                .get(auth::login_page),
        )
        .route(
            "/register",
            post(auth::register)
                .layer(auth_rate_limiter())
                .get(auth::register_page),
        )
        .route("/logout", post(auth::logout))
}

/// Pages behind the role guards.
pub fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/account", get(account::account_page).post(account::update))
        .route("/chat", get(chat::chat_page).post(chat::send))
        .route(
            "/book-service",
            get(booking::booking_page).post(booking::submit),
        )
        .route("/my-requests", get(requests::my_requests))
        .route("/schedule", get(schedule::schedule))
        .route("/schedule/{id}/complete", post(schedule::complete))
        .route("/reports", get(reports::reports_page).post(reports::submit))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(auth_routes())
        .merge(portal_routes())
}
