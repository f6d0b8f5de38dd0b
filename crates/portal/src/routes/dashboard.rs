//! Landing page after sign-in.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use chrono::Local;
use tracing::instrument;

use kindred_core::booking::ServiceRequest;

use super::{MessageQuery, Nav};
use crate::db::{ProfileRepository, RepositoryError, ServiceRequestRepository};
use crate::middleware::RequireSignedIn;
use crate::state::AppState;

/// Requests and visits listed on the dashboard.
const DASHBOARD_ITEMS: i64 = 3;

/// Banner when the employee lookup failed and the role is unknown.
pub const ROLE_UNAVAILABLE: &str =
    "We couldn't verify your access right now. Please refresh the page to try again.";

/// Banner when requests or visits could not be loaded.
pub const DASHBOARD_UNAVAILABLE: &str =
    "We couldn't load your latest activity right now. Please refresh the page to try again.";

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub first_name: String,
    /// Client's latest bookings.
    pub recent_requests: Vec<ServiceRequest>,
    /// Employee's next open visits.
    pub next_visits: Vec<ServiceRequest>,
    pub success: Option<String>,
    pub error: Option<String>,
}

fn success_message(code: &str) -> Option<String> {
    match code {
        "booked" => Some("Your request has been received. We'll confirm it shortly.".to_string()),
        _ => None,
    }
}

/// Log a failed dashboard read and carry on without its rows.
fn or_empty<T: Default>(result: Result<T, RepositoryError>, what: &str, failed: &mut bool) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, what, "dashboard read failed");
        *failed = true;
        T::default()
    })
}

/// Display the dashboard for any signed-in user.
///
/// Clients see their recent requests, employees their next visits. When the
/// role could not be verified neither list is shown and a retry banner
/// explains why. Failed reads degrade to empty lists with a banner.
#[instrument(skip(state, signed_in, query), fields(user_id = %signed_in.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    signed_in: RequireSignedIn,
    Query(query): Query<MessageQuery>,
) -> DashboardTemplate {
    let RequireSignedIn {
        user,
        role,
        role_unavailable,
    } = signed_in;
    let mut load_failed = false;

    let profile = or_empty(
        ProfileRepository::new(state.pool())
            .get(user.id)
            .await
            .map(Option::unwrap_or_default),
        "profile",
        &mut load_failed,
    );

    let requests = ServiceRequestRepository::new(state.pool());
    let recent_requests = if role.is_client {
        or_empty(
            requests.list_for_user(user.id, Some(DASHBOARD_ITEMS)).await,
            "recent requests",
            &mut load_failed,
        )
    } else {
        Vec::new()
    };
    let next_visits = if role.is_employee {
        or_empty(
            requests
                .list_upcoming(Local::now().naive_local(), DASHBOARD_ITEMS)
                .await,
            "next visits",
            &mut load_failed,
        )
    } else {
        Vec::new()
    };

    let error = if role_unavailable {
        Some(ROLE_UNAVAILABLE.to_string())
    } else if load_failed {
        Some(DASHBOARD_UNAVAILABLE.to_string())
    } else {
        None
    };

    DashboardTemplate {
        nav: Nav::for_role(role),
        first_name: profile.first_name().to_string(),
        recent_requests,
        next_visits,
        success: query.success.as_deref().and_then(success_message),
        error,
    }
}
