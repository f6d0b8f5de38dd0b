//! Status and category enums stored alongside bookings and catalog rows.

use serde::{Deserialize, Serialize};

/// Lifecycle of a service request.
///
/// New bookings always start as [`RequestStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "kindred.request_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// Whether a request in this state may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled | Self::Completed)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }

    /// Completed and cancelled requests never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Wire/database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid request status: {s}")),
        }
    }
}

/// Which side of the business a catalog row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "kindred.care_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CareCategory {
    Child,
    Elderly,
}

impl CareCategory {
    /// Heading used on the pricing pages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Child => "Childcare",
            Self::Elderly => "Elderly Care",
        }
    }
}

impl std::fmt::Display for CareCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Child => write!(f, "child"),
            Self::Elderly => write!(f, "elderly"),
        }
    }
}

impl std::str::FromStr for CareCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "child" => Ok(Self::Child),
            "elderly" => Ok(Self::Elderly),
            _ => Err(format!("invalid care category: {s}")),
        }
    }
}

/// Monthly package tier. Only drives card styling and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "kindred.package_tier", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Basic,
    Standard,
    Premium,
}

impl PackageTier {
    /// CSS modifier for the package card.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Basic => "package--basic",
            Self::Standard => "package--standard",
            Self::Premium => "package--premium",
        }
    }

    /// The middle tier is highlighted as the most popular choice.
    #[must_use]
    pub const fn is_featured(self) -> bool {
        matches!(self, Self::Standard)
    }
}

impl std::fmt::Display for PackageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Standard => write!(f, "standard"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for PackageTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            _ => Err(format!("invalid package tier: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requests_default_to_pending() {
        assert_eq!(RequestStatus::default(), RequestStatus::Pending);
    }

    #[test]
    fn test_status_transitions() {
        use RequestStatus::{Cancelled, Completed, Confirmed, Pending};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(Completed.is_terminal());
        assert!(!Confirmed.is_terminal());
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Confirmed,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("done".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&RequestStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }

    #[test]
    fn test_tiers_order_basic_to_premium() {
        let mut tiers = vec![PackageTier::Premium, PackageTier::Basic, PackageTier::Standard];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![PackageTier::Basic, PackageTier::Standard, PackageTier::Premium]
        );
        assert!(PackageTier::Standard.is_featured());
    }

    #[test]
    fn test_care_category_parse() {
        assert_eq!("elderly".parse::<CareCategory>().unwrap(), CareCategory::Elderly);
        assert!("adult".parse::<CareCategory>().is_err());
        assert_eq!(CareCategory::Child.label(), "Childcare");
    }
}
