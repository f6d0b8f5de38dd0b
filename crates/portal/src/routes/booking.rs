//! Client booking form.
//!
//! The form is validated in full before anything is written. A request that
//! passes validation but fails to save re-renders the form with the storage
//! error so the family can retry without retyping.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use tracing::instrument;

use kindred_core::booking::BookingDraft;

use super::{Nav, capitalize};
use crate::db::{CatalogRepository, ProfileRepository, ServiceRequestRepository};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireClient;
use crate::state::AppState;

/// Suggestions offered in the care type field.
pub const CARE_TYPES: [&str; 5] = ["baby", "toddler", "school-age", "elderly", "dementia care"];

/// Booking page template.
#[derive(Template, WebTemplate)]
#[template(path = "book_service.html")]
pub struct BookingTemplate {
    pub nav: Nav,
    pub draft: BookingDraft,
    /// Hourly offerings used as service type suggestions.
    pub service_names: Vec<String>,
    pub care_types: &'static [&'static str],
    /// Earliest selectable date, `YYYY-MM-DD`.
    pub min_date: String,
    pub error: Option<String>,
}

/// The business's current local date.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn render_form(state: &AppState, draft: BookingDraft, error: Option<String>) -> BookingTemplate {
    let service_names = CatalogRepository::new(state.pool())
        .offerings()
        .await
        .map(|offerings| offerings.into_iter().map(|o| o.name).collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load service suggestions");
            Vec::new()
        });

    BookingTemplate {
        nav: Nav::client(),
        draft,
        service_names,
        care_types: &CARE_TYPES,
        min_date: today().format("%Y-%m-%d").to_string(),
        error,
    }
}

/// Display the booking form, pre-filled with the client's address.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn booking_page(
    State(state): State<AppState>,
    RequireClient(user): RequireClient,
) -> Result<BookingTemplate> {
    let profile = ProfileRepository::new(state.pool()).get(user.id).await?;
    let draft = BookingDraft::prefilled(profile.as_ref().and_then(|p| p.address.as_deref()));

    Ok(render_form(&state, draft, None).await)
}

/// Validate and save a booking, then return to the dashboard.
#[instrument(skip(state, user, draft), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireClient(user): RequireClient,
    Form(draft): Form<BookingDraft>,
) -> Response {
    let request = match draft.validate(today()) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "booking rejected");
            let page = render_form(&state, draft, Some(capitalize(&e.to_string()))).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    match ServiceRequestRepository::new(state.pool())
        .create(user.id, &request)
        .await
    {
        Ok(created) => {
            let id = created.id.to_string();
            add_breadcrumb("booking", "Service request created", Some(&[("request_id", &id)]));
            tracing::info!(request_id = %created.id, start = %created.start_time, "service request created");
            Redirect::to("/dashboard?success=booked").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to save service request");
            let page = render_form(&state, draft, Some(e.to_string())).await;
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}
