//! Who is asking: the signed-in identity and the staff validation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, EmployeeId, RoleMetadata, UserId};

/// The authenticated identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub email: Option<Email>,
    /// Cached role hint; may be stale or missing.
    pub role_metadata: Option<RoleMetadata>,
}

impl SessionIdentity {
    #[must_use]
    pub const fn new(user_id: UserId, role_metadata: Option<RoleMetadata>) -> Self {
        Self {
            user_id,
            email: None,
            role_metadata,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }
}

/// A staff record created out-of-band by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub user_id: UserId,
    pub email: Email,
    pub is_validated: bool,
    pub last_login: Option<DateTime<Utc>>,
}
