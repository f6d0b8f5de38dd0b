//! Caregiver schedule.
//!
//! Completing a visit updates the board first, then the database. A failed
//! or lost write reverts the board, and the page is shown again with the
//! visit back in its previous state.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Days, Local, NaiveDateTime};
use tracing::instrument;

use kindred_core::booking::ServiceRequest;
use kindred_core::schedule::{ScheduleBoard, ScheduleError};
use kindred_core::{RequestStatus, ServiceRequestId};

use super::{MessageQuery, Nav, capitalize};
use crate::db::ServiceRequestRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireEmployee;
use crate::state::AppState;

/// Most visits shown on the board.
const SCHEDULE_LIMIT: i64 = 50;

/// Schedule page template.
#[derive(Template, WebTemplate)]
#[template(path = "schedule.html")]
pub struct ScheduleTemplate {
    pub nav: Nav,
    pub visits: Vec<ServiceRequest>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ScheduleTemplate {
    fn from_board(board: &ScheduleBoard, error: Option<String>, success: Option<String>) -> Self {
        Self {
            nav: Nav::employee(),
            visits: board.open().cloned().collect(),
            error,
            success,
        }
    }
}

/// Visits from the start of yesterday onwards, so overnight care that began
/// yesterday can still be completed.
fn schedule_window_start() -> NaiveDateTime {
    let today = Local::now().date_naive();
    today
        .checked_sub_days(Days::new(1))
        .unwrap_or(today)
        .and_time(chrono::NaiveTime::MIN)
}

async fn load_board(state: &AppState) -> Result<ScheduleBoard> {
    let visits = ServiceRequestRepository::new(state.pool())
        .list_upcoming(schedule_window_start(), SCHEDULE_LIMIT)
        .await?;
    Ok(ScheduleBoard::new(visits))
}

/// Show open visits.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn schedule(
    State(state): State<AppState>,
    RequireEmployee(user): RequireEmployee,
    Query(query): Query<MessageQuery>,
) -> Result<ScheduleTemplate> {
    let board = load_board(&state).await?;
    let success = query
        .success
        .filter(|s| s == "completed")
        .map(|_| "Visit marked as completed.".to_string());

    Ok(ScheduleTemplate::from_board(&board, None, success))
}

/// Mark a visit completed.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn complete(
    State(state): State<AppState>,
    RequireEmployee(user): RequireEmployee,
    Path(id): Path<ServiceRequestId>,
) -> Result<Response> {
    let mut board = load_board(&state).await?;

    let change = match board.apply(id, RequestStatus::Completed) {
        Ok(change) => change,
        Err(ScheduleError::UnknownRequest(_)) => {
            return Err(AppError::NotFound(format!("visit {id}")));
        }
        Err(e @ ScheduleError::InvalidTransition { .. }) => {
            let page = ScheduleTemplate::from_board(&board, Some(capitalize(&e.to_string())), None);
            return Ok((StatusCode::CONFLICT, page).into_response());
        }
    };

    let persisted = ServiceRequestRepository::new(state.pool())
        .update_status(change.request_id, change.previous, change.next)
        .await;

    let error = match persisted {
        Ok(true) => {
            let request_id = id.to_string();
            add_breadcrumb(
                "schedule",
                "Visit completed",
                Some(&[("request_id", &request_id)]),
            );
            tracing::info!(request_id = %id, "visit completed");
            return Ok(Redirect::to("/schedule?success=completed").into_response());
        }
        Ok(false) => {
            tracing::info!(request_id = %id, "visit changed by someone else");
            "This visit was updated by someone else. Refresh to see its current status."
        }
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "failed to complete visit");
            "We couldn't save that change. Please try again."
        }
    };

    board.revert(change);
    let page = ScheduleTemplate::from_board(&board, Some(error.to_string()), None);
    Ok((StatusCode::CONFLICT, page).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_starts_at_midnight_yesterday() {
        let start = schedule_window_start();
        let today = Local::now().date_naive();
        assert_eq!(start.time(), chrono::NaiveTime::MIN);
        assert_eq!(today.signed_duration_since(start.date()).num_days(), 1);
    }
}
