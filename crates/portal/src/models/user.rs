//! Account and profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_core::{Email, RoleMetadata, UserId};

/// A portal account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub role_metadata: Option<RoleMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact details for an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientProfile {
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ClientProfile {
    /// First word of the name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("there")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let profile = ClientProfile {
            full_name: "Maria Lopez".to_string(),
            ..ClientProfile::default()
        };
        assert_eq!(profile.first_name(), "Maria");
        assert_eq!(ClientProfile::default().first_name(), "there");
    }
}
