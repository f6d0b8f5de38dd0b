//! Caregiver schedule board with optimistic status changes.
//!
//! A status change is applied to the board first, then persisted. If
//! persisting fails the change is reverted, leaving the board as it was.

use thiserror::Error;

use crate::booking::ServiceRequest;
use crate::types::{RequestStatus, ServiceRequestId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("service request {0} is not on this schedule")]
    UnknownRequest(ServiceRequestId),

    #[error("cannot change a {from} request to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
}

/// A change applied locally and awaiting persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending change must be committed or reverted"]
pub struct StatusChange {
    pub request_id: ServiceRequestId,
    pub previous: RequestStatus,
    pub next: RequestStatus,
}

/// Upcoming visits, ordered by start time.
#[derive(Debug, Clone, Default)]
pub struct ScheduleBoard {
    visits: Vec<ServiceRequest>,
}

impl ScheduleBoard {
    #[must_use]
    pub fn new(mut visits: Vec<ServiceRequest>) -> Self {
        visits.sort_by_key(|v| (v.start_time, v.id.as_i32()));
        Self { visits }
    }

    #[must_use]
    pub fn visits(&self) -> &[ServiceRequest] {
        &self.visits
    }

    #[must_use]
    pub fn get(&self, id: ServiceRequestId) -> Option<&ServiceRequest> {
        self.visits.iter().find(|v| v.id == id)
    }

    /// Visits still awaiting care.
    pub fn open(&self) -> impl Iterator<Item = &ServiceRequest> {
        self.visits.iter().filter(|v| !v.status.is_terminal())
    }

    /// Apply a status change to the board.
    ///
    /// # Errors
    ///
    /// Fails when the request is not on the board or the transition is not
    /// allowed; the board is unchanged in that case.
    pub fn apply(
        &mut self,
        request_id: ServiceRequestId,
        next: RequestStatus,
    ) -> Result<StatusChange, ScheduleError> {
        let visit = self
            .visits
            .iter_mut()
            .find(|v| v.id == request_id)
            .ok_or(ScheduleError::UnknownRequest(request_id))?;

        let previous = visit.status;
        if !previous.can_transition_to(next) {
            return Err(ScheduleError::InvalidTransition {
                from: previous,
                to: next,
            });
        }

        visit.status = next;
        Ok(StatusChange {
            request_id,
            previous,
            next,
        })
    }

    /// Undo a change whose persistence failed.
    pub fn revert(&mut self, change: StatusChange) {
        if let Some(visit) = self
            .visits
            .iter_mut()
            .find(|v| v.id == change.request_id && v.status == change.next)
        {
            visit.status = change.previous;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::types::UserId;

    fn visit(id: i32, day: u32, status: RequestStatus) -> ServiceRequest {
        ServiceRequest {
            id: ServiceRequestId::new(id),
            user_id: UserId::new(1),
            service_type: "Overnight Care".to_owned(),
            care_type: "elderly".to_owned(),
            address: "X".to_owned(),
            start_time: NaiveDate::from_ymd_opt(2026, 5, day)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            duration_hours: 8,
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn board() -> ScheduleBoard {
        ScheduleBoard::new(vec![
            visit(2, 12, RequestStatus::Confirmed),
            visit(1, 10, RequestStatus::Pending),
            visit(3, 11, RequestStatus::Completed),
        ])
    }

    #[test]
    fn test_board_is_ordered_by_start() {
        let ids: Vec<_> = board().visits().iter().map(|v| v.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(board().open().count(), 2);
    }

    #[test]
    fn test_apply_then_revert_restores_status() {
        let mut board = board();
        let change = board
            .apply(ServiceRequestId::new(2), RequestStatus::Completed)
            .unwrap();
        assert_eq!(change.previous, RequestStatus::Confirmed);
        assert_eq!(
            board.get(ServiceRequestId::new(2)).unwrap().status,
            RequestStatus::Completed
        );

        board.revert(change);
        assert_eq!(
            board.get(ServiceRequestId::new(2)).unwrap().status,
            RequestStatus::Confirmed
        );
    }

    #[test]
    fn test_invalid_transition_leaves_board_untouched() {
        let mut board = board();
        let err = board
            .apply(ServiceRequestId::new(3), RequestStatus::Completed)
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InvalidTransition {
                from: RequestStatus::Completed,
                to: RequestStatus::Completed
            }
        );
        assert_eq!(
            board.get(ServiceRequestId::new(3)).unwrap().status,
            RequestStatus::Completed
        );
    }

    #[test]
    fn test_unknown_request() {
        let mut board = board();
        assert_eq!(
            board.apply(ServiceRequestId::new(99), RequestStatus::Completed),
            Err(ScheduleError::UnknownRequest(ServiceRequestId::new(99)))
        );
    }

    #[test]
    fn test_revert_ignores_superseded_change() {
        let mut board = board();
        let change = board
            .apply(ServiceRequestId::new(1), RequestStatus::Confirmed)
            .unwrap();
        let _later = board
            .apply(ServiceRequestId::new(1), RequestStatus::Completed)
            .unwrap();

        board.revert(change);
        assert_eq!(
            board.get(ServiceRequestId::new(1)).unwrap().status,
            RequestStatus::Completed
        );
    }
}
