//! Role resolution and page guards, end to end over in-memory storage.
//!
//! These scenarios run the resolver, the cached role service and the guard
//! decision together the way a page request does.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::NaiveDate;

use kindred_core::booking::{BookingDraft, ServiceRequest};
use kindred_core::guard::{GuardDecision, GuardInput, RedirectTarget, RequiredRole, decide};
use kindred_core::identity::SessionIdentity;
use kindred_core::resolver::RoleResolver;
use kindred_core::schedule::ScheduleBoard;
use kindred_core::{RequestStatus, RoleMetadata, RoleState, ServiceRequestId, UserId};
use kindred_integration_tests::InMemoryRoles;
use kindred_portal::services::{RoleService, SessionEvent, SessionEvents};

const CLIENT: UserId = UserId::new(1);
const EMPLOYEE: UserId = UserId::new(2);
const PRETENDER: UserId = UserId::new(3);

fn roles() -> InMemoryRoles {
    let store = InMemoryRoles::new();
    store.set_metadata(CLIENT, RoleMetadata::Client);
    store.set_metadata(EMPLOYEE, RoleMetadata::Employee);
    store.add_employee(EMPLOYEE, "carer@kindredcare.example", true);
    store.set_metadata(PRETENDER, RoleMetadata::Employee);
    store.add_employee(PRETENDER, "pending@kindredcare.example", false);
    store
}

fn guard(session: Option<&SessionIdentity>, required: Option<RequiredRole>, role: RoleState) -> GuardDecision {
    decide(&GuardInput::new(session.is_some(), required, role))
}

#[tokio::test]
async fn test_client_sessions_never_query_the_directory() {
    let store = roles();
    let resolver = RoleResolver::new(store.clone(), store.clone());

    for _ in 0..5 {
        let session = SessionIdentity::new(CLIENT, Some(RoleMetadata::Client));
        let state = resolver.role_state(Some(&session)).await;
        assert!(state.is_client && !state.is_employee);
    }

    assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn test_unvalidated_employee_is_downgraded_and_healed() {
    let store = roles();
    let resolver = RoleResolver::new(store.clone(), store.clone());
    let session = SessionIdentity::new(PRETENDER, Some(RoleMetadata::Employee));

    let resolution = resolver.resolve(Some(&session)).await.unwrap();

    assert!(resolution.state().is_client);
    assert!(!resolution.state().is_employee);
    assert_eq!(resolution.corrected_metadata, Some(RoleMetadata::Client));
    assert_eq!(store.metadata(PRETENDER), Some(RoleMetadata::Client));

    // Healing is idempotent.
    let healed = SessionIdentity::new(PRETENDER, resolution.corrected_metadata);
    let again = resolver.resolve(Some(&healed)).await.unwrap();
    assert_eq!(again.corrected_metadata, None);
    assert_eq!(store.metadata(PRETENDER), Some(RoleMetadata::Client));
}

#[tokio::test]
async fn test_lookup_failure_fails_closed() {
    let store = roles();
    store.make_unreachable(EMPLOYEE);
    let resolver = RoleResolver::new(store.clone(), store.clone());
    let session = SessionIdentity::new(EMPLOYEE, Some(RoleMetadata::Employee));

    let state = resolver.role_state(Some(&session)).await;

    assert_eq!(state, RoleState::denied());
    assert_eq!(
        guard(Some(&session), Some(RequiredRole::Employee), state),
        GuardDecision::Redirect(RedirectTarget::Dashboard)
    );
    // The stored hint is left alone when the lookup failed.
    assert_eq!(store.metadata(EMPLOYEE), Some(RoleMetadata::Employee));
}

#[tokio::test]
async fn test_page_access_matrix() {
    let store = roles();
    let service = RoleService::new(store.clone(), &SessionEvents::new(), Duration::from_secs(60));

    let client = SessionIdentity::new(CLIENT, Some(RoleMetadata::Client));
    let employee = SessionIdentity::new(EMPLOYEE, Some(RoleMetadata::Employee));

    // Unauthenticated user on a client page goes to sign-in.
    let anonymous = service.role_state(None).await;
    assert_eq!(
        guard(None, Some(RequiredRole::Client), anonymous),
        GuardDecision::Redirect(RedirectTarget::Login)
    );

    // Client on the caregiver schedule lands on the dashboard.
    let client_state = service.role_state(Some(&client)).await;
    assert_eq!(
        guard(Some(&client), Some(RequiredRole::Employee), client_state),
        GuardDecision::Redirect(RedirectTarget::Dashboard)
    );
    assert!(guard(Some(&client), Some(RequiredRole::Client), client_state).is_allowed());

    // Validated employee on the booking form lands on the dashboard.
    let employee_state = service.role_state(Some(&employee)).await;
    assert_eq!(
        guard(Some(&employee), Some(RequiredRole::Client), employee_state),
        GuardDecision::Redirect(RedirectTarget::Dashboard)
    );
    assert!(guard(Some(&employee), Some(RequiredRole::Employee), employee_state).is_allowed());
    assert!(guard(Some(&employee), None, employee_state).is_allowed());

    // While loading nobody is redirected.
    assert_eq!(
        guard(Some(&client), Some(RequiredRole::Employee), RoleState::loading()),
        GuardDecision::Loading
    );
}

#[tokio::test]
async fn test_revalidation_reaches_cached_sessions_after_sign_in() {
    let store = roles();
    let events = SessionEvents::new();
    let service = RoleService::new(store.clone(), &events, Duration::from_secs(3600));
    let session = SessionIdentity::new(PRETENDER, Some(RoleMetadata::Employee));

    assert!(!service.role_state(Some(&session)).await.is_employee);

    // An operator validates the record; a new sign-in evicts the cached answer.
    store.add_employee(PRETENDER, "pending@kindredcare.example", true);
    store.set_metadata(PRETENDER, RoleMetadata::Employee);
    events.emit(SessionEvent::SignedIn(PRETENDER));

    let mut state = service.role_state(Some(&session)).await;
    for _ in 0..50 {
        if state.is_employee {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        state = service.role_state(Some(&session)).await;
    }
    assert!(state.is_employee);
}

#[test]
fn test_client_booking_is_pending() {
    let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let draft = BookingDraft {
        service_type: "Companion Visits".to_string(),
        care_type: "elderly".to_string(),
        address: "14 Orchard Lane".to_string(),
        date: "2026-03-05".to_string(),
        time: "10:30".to_string(),
        duration_hours: "3".to_string(),
        notes: "Likes a walk after lunch".to_string(),
    };

    let request = draft.validate(today).unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.duration_hours, 3);
    assert_eq!(request.start_time.date(), NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    assert_eq!(request.notes.as_deref(), Some("Likes a walk after lunch"));
}

#[test]
fn test_failed_completion_restores_the_schedule() {
    let start = NaiveDate::from_ymd_opt(2026, 3, 3)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let visit = ServiceRequest {
        id: ServiceRequestId::new(7),
        user_id: CLIENT,
        service_type: "Full-Day Childcare".to_string(),
        care_type: "toddler".to_string(),
        address: "2 Mill Road".to_string(),
        start_time: start,
        duration_hours: 8,
        status: RequestStatus::Confirmed,
        notes: None,
        created_at: chrono::Utc::now(),
    };
    let mut board = ScheduleBoard::new(vec![visit]);
    let before = board.visits().to_vec();

    let change = board.apply(ServiceRequestId::new(7), RequestStatus::Completed).unwrap();
    assert_eq!(board.open().count(), 0);

    // The write failed: undo the optimistic change.
    board.revert(change);
    assert_eq!(board.visits(), before.as_slice());
    assert_eq!(board.open().count(), 1);
}
