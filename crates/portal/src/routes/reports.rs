//! Care reports filed by caregivers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Local};
use serde::Deserialize;
use tracing::instrument;

use kindred_core::ServiceRequestId;
use kindred_core::booking::ServiceRequest;

use super::{MessageQuery, Nav};
use crate::db::{ReportRepository, RepositoryError, ServiceRequestRepository};
use crate::error::Result;
use crate::middleware::RequireEmployee;
use crate::models::{CareReport, CurrentUser, MAX_SUMMARY_LENGTH};
use crate::state::AppState;

/// How far back visits can be reported on.
const REPORTABLE_DAYS: i64 = 14;

/// Most visits offered in the report form.
const REPORTABLE_LIMIT: i64 = 100;

/// Report form data.
#[derive(Debug, Deserialize)]
pub struct ReportForm {
    pub service_request_id: ServiceRequestId,
    #[serde(default)]
    pub summary: String,
}

impl ReportForm {
    /// The trimmed summary, or an error message for the form.
    fn summary(&self) -> std::result::Result<&str, String> {
        let summary = self.summary.trim();
        if summary.is_empty() {
            return Err("Please describe the visit.".to_string());
        }
        if summary.chars().count() > MAX_SUMMARY_LENGTH {
            return Err(format!(
                "Reports must be at most {MAX_SUMMARY_LENGTH} characters."
            ));
        }
        Ok(summary)
    }
}

/// Reports page template.
#[derive(Template, WebTemplate)]
#[template(path = "reports.html")]
pub struct ReportsTemplate {
    pub nav: Nav,
    pub reports: Vec<CareReport>,
    pub visits: Vec<ServiceRequest>,
    pub max_length: usize,
    pub summary: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

async fn render_page(
    state: &AppState,
    user: &CurrentUser,
    summary: String,
    error: Option<String>,
    success: Option<String>,
) -> Result<ReportsTemplate> {
    let reports = ReportRepository::new(state.pool())
        .list_by_author(user.id)
        .await?;
    let since = Local::now().naive_local() - Duration::days(REPORTABLE_DAYS);
    let visits = ServiceRequestRepository::new(state.pool())
        .list_recent(since, REPORTABLE_LIMIT)
        .await?;

    Ok(ReportsTemplate {
        nav: Nav::employee(),
        reports,
        visits,
        max_length: MAX_SUMMARY_LENGTH,
        summary,
        error,
        success,
    })
}

/// Show the caregiver's reports and the report form.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn reports_page(
    State(state): State<AppState>,
    RequireEmployee(user): RequireEmployee,
    Query(query): Query<MessageQuery>,
) -> Result<ReportsTemplate> {
    let success = query
        .success
        .filter(|s| s == "filed")
        .map(|_| "Report filed. Thank you.".to_string());

    render_page(&state, &user, String::new(), None, success).await
}

/// File a report for a visit.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireEmployee(user): RequireEmployee,
    Form(form): Form<ReportForm>,
) -> Result<Response> {
    let summary = match form.summary() {
        Ok(summary) => summary,
        Err(message) => {
            let page = render_page(&state, &user, form.summary.clone(), Some(message), None).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match ReportRepository::new(state.pool())
        .create(form.service_request_id, user.id, summary)
        .await
    {
        Ok(report) => {
            tracing::info!(report_id = %report.id, "care report filed");
            Ok(Redirect::to("/reports?success=filed").into_response())
        }
        Err(RepositoryError::NotFound) => {
            let page = render_page(
                &state,
                &user,
                form.summary.clone(),
                Some("That visit no longer exists.".to_string()),
                None,
            )
            .await?;
            Ok((StatusCode::NOT_FOUND, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(summary: &str) -> ReportForm {
        ReportForm {
            service_request_id: ServiceRequestId::new(1),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_summary_is_trimmed() {
        assert_eq!(form("  Played outside, lunch at noon.\n").summary(), Ok("Played outside, lunch at noon."));
    }

    #[test]
    fn test_summary_rejects_blank_and_long() {
        assert!(form("   ").summary().is_err());
        assert!(form(&"x".repeat(MAX_SUMMARY_LENGTH + 1)).summary().is_err());
        assert!(form(&"x".repeat(MAX_SUMMARY_LENGTH)).summary().is_ok());
    }
}
