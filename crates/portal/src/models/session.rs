//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use kindred_core::identity::SessionIdentity;
use kindred_core::{Email, RoleMetadata, UserId};

use super::user::User;

/// Session-stored user identity.
///
/// `role_metadata` is a copy of the stored hint taken at sign-in and kept in
/// step with corrections made by the role resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Cached role hint.
    pub role_metadata: Option<RoleMetadata>,
}

impl CurrentUser {
    /// Identity handed to the role resolver.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::new(self.id, self.role_metadata).with_email(self.email.clone())
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role_metadata: user.role_metadata,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the simulated office chat transcript.
    pub const CHAT_TRANSCRIPT: &str = "chat_transcript";
}
