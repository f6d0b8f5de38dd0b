//! Care reports written by caregivers after a visit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_core::{CareReportId, ServiceRequestId, UserId};

/// Maximum length of a report summary.
pub const MAX_SUMMARY_LENGTH: usize = 4000;

/// A submitted care report.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CareReport {
    pub id: CareReportId,
    pub service_request_id: ServiceRequestId,
    pub author_user_id: UserId,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    /// Service type of the visit, joined in for display.
    pub service_type: String,
}
