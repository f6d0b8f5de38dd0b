//! Page access decisions.
//!
//! A guard is a pure function of the session presence, the resolver's
//! [`RoleState`], and the role a page requires:
//!
//! ```text
//! loading                          -> Loading (no redirect)
//! no session                       -> Redirect(Login)
//! required role not held           -> Redirect(Dashboard)
//! otherwise                        -> Allow
//! ```
//!
//! Signed-in users with the wrong role land on the dashboard, never the login
//! page, so they are not asked to sign in again.

use serde::{Deserialize, Serialize};

use crate::types::RoleState;

/// Role a page is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredRole {
    Client,
    Employee,
}

/// Where a denied request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Login,
    Dashboard,
}

impl RedirectTarget {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

/// Which kind of access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ClientAllowed,
    EmployeeAllowed,
    AnyAuthenticatedAllowed,
}

/// Guard verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    Redirect(RedirectTarget),
    Allow(Access),
}

impl GuardDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Everything a guard looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardInput {
    pub has_session: bool,
    /// `None` admits any signed-in user.
    pub required: Option<RequiredRole>,
    pub role: RoleState,
}

impl GuardInput {
    #[must_use]
    pub const fn new(has_session: bool, required: Option<RequiredRole>, role: RoleState) -> Self {
        Self {
            has_session,
            required,
            role,
        }
    }
}

/// Decide whether a page may render.
#[must_use]
pub const fn decide(input: &GuardInput) -> GuardDecision {
    if input.role.is_loading {
        return GuardDecision::Loading;
    }
    if !input.has_session {
        return GuardDecision::Redirect(RedirectTarget::Login);
    }

    match input.required {
        Some(RequiredRole::Client) if !input.role.is_client => {
            GuardDecision::Redirect(RedirectTarget::Dashboard)
        }
        Some(RequiredRole::Employee) if !input.role.is_employee => {
            GuardDecision::Redirect(RedirectTarget::Dashboard)
        }
        Some(RequiredRole::Client) => GuardDecision::Allow(Access::ClientAllowed),
        Some(RequiredRole::Employee) => GuardDecision::Allow(Access::EmployeeAllowed),
        None => GuardDecision::Allow(Access::AnyAuthenticatedAllowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolvedRole;

    const REQUIREMENTS: [Option<RequiredRole>; 3] =
        [None, Some(RequiredRole::Client), Some(RequiredRole::Employee)];

    fn client() -> RoleState {
        RoleState::from(ResolvedRole::Client)
    }

    fn employee() -> RoleState {
        RoleState::from(ResolvedRole::Employee)
    }

    #[test]
    fn test_loading_never_redirects() {
        for required in REQUIREMENTS {
            for has_session in [true, false] {
                let input = GuardInput::new(has_session, required, RoleState::loading());
                assert_eq!(decide(&input), GuardDecision::Loading);
            }
        }
    }

    #[test]
    fn test_no_session_always_goes_to_login() {
        for required in REQUIREMENTS {
            for role in [RoleState::denied(), client(), employee()] {
                let input = GuardInput::new(false, required, role);
                assert_eq!(
                    decide(&input),
                    GuardDecision::Redirect(RedirectTarget::Login),
                    "required={required:?} role={role:?}"
                );
            }
        }
    }

    #[test]
    fn test_client_on_employee_page_goes_to_dashboard() {
        let input = GuardInput::new(true, Some(RequiredRole::Employee), client());
        assert_eq!(
            decide(&input),
            GuardDecision::Redirect(RedirectTarget::Dashboard)
        );
    }

    #[test]
    fn test_employee_on_client_page_goes_to_dashboard() {
        let input = GuardInput::new(true, Some(RequiredRole::Client), employee());
        assert_eq!(
            decide(&input),
            GuardDecision::Redirect(RedirectTarget::Dashboard)
        );
    }

    #[test]
    fn test_matching_roles_are_allowed() {
        assert_eq!(
            decide(&GuardInput::new(true, Some(RequiredRole::Client), client())),
            GuardDecision::Allow(Access::ClientAllowed)
        );
        assert_eq!(
            decide(&GuardInput::new(true, Some(RequiredRole::Employee), employee())),
            GuardDecision::Allow(Access::EmployeeAllowed)
        );
    }

    #[test]
    fn test_any_authenticated_admits_unresolved_role() {
        // A failed resolution leaves both flags false; the dashboard still
        // renders so the user can see the error.
        let input = GuardInput::new(true, None, RoleState::denied());
        assert_eq!(
            decide(&input),
            GuardDecision::Allow(Access::AnyAuthenticatedAllowed)
        );
    }

    #[test]
    fn test_failed_resolution_is_denied_on_role_pages() {
        for required in [RequiredRole::Client, RequiredRole::Employee] {
            let input = GuardInput::new(true, Some(required), RoleState::denied());
            assert!(!decide(&input).is_allowed());
        }
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(RedirectTarget::Login.path(), "/login");
        assert_eq!(RedirectTarget::Dashboard.path(), "/dashboard");
    }
}
