//! Role metadata and resolved roles.
//!
//! [`RoleMetadata`] is the persisted hint stored with an account. It is only a
//! hint: the employee validation table decides who is actually staff, and the
//! [`crate::resolver`] turns metadata plus that lookup into a [`ResolvedRole`].

use serde::{Deserialize, Serialize};

/// Role hint persisted on the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleMetadata {
    /// A family booking care.
    Client,
    /// Caregiver staff (authoritative only once validated).
    Employee,
}

impl RoleMetadata {
    /// Parse stored metadata.
    ///
    /// Anything other than `client` or `employee` is treated as unset, so a
    /// stray value never short-circuits resolution.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            Some("client") => Some(Self::Client),
            Some("employee") => Some(Self::Employee),
            _ => None,
        }
    }

    /// Database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Employee => "employee",
        }
    }
}

impl std::fmt::Display for RoleMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleMetadata {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_stored(Some(s)).ok_or_else(|| format!("invalid role: {s}"))
    }
}

/// The effective role of a request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedRole {
    Unauthenticated,
    Client,
    Employee,
}

impl ResolvedRole {
    #[must_use]
    pub const fn is_client(self) -> bool {
        matches!(self, Self::Client)
    }

    #[must_use]
    pub const fn is_employee(self) -> bool {
        matches!(self, Self::Employee)
    }
}

/// Flags consumed by page guards and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleState {
    pub is_client: bool,
    pub is_employee: bool,
    pub is_loading: bool,
}

impl RoleState {
    /// Resolution still in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            is_client: false,
            is_employee: false,
            is_loading: true,
        }
    }

    /// Neither role. Used for signed-out visitors and whenever the employee
    /// lookup fails, so a backend error never grants access.
    #[must_use]
    pub const fn denied() -> Self {
        Self {
            is_client: false,
            is_employee: false,
            is_loading: false,
        }
    }
}

impl From<ResolvedRole> for RoleState {
    fn from(role: ResolvedRole) -> Self {
        Self {
            is_client: role.is_client(),
            is_employee: role.is_employee(),
            is_loading: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stored_known_values() {
        assert_eq!(
            RoleMetadata::from_stored(Some("client")),
            Some(RoleMetadata::Client)
        );
        assert_eq!(
            RoleMetadata::from_stored(Some("employee")),
            Some(RoleMetadata::Employee)
        );
    }

    #[test]
    fn test_from_stored_unknown_is_unset() {
        assert_eq!(RoleMetadata::from_stored(None), None);
        assert_eq!(RoleMetadata::from_stored(Some("")), None);
        assert_eq!(RoleMetadata::from_stored(Some("admin")), None);
        assert_eq!(RoleMetadata::from_stored(Some("Employee")), None);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!("client".parse::<RoleMetadata>().unwrap(), RoleMetadata::Client);
        assert!("caregiver".parse::<RoleMetadata>().is_err());
    }

    #[test]
    fn test_role_state_from_resolved() {
        assert_eq!(
            RoleState::from(ResolvedRole::Employee),
            RoleState {
                is_client: false,
                is_employee: true,
                is_loading: false
            }
        );
        assert_eq!(RoleState::from(ResolvedRole::Unauthenticated), RoleState::denied());
    }
}
