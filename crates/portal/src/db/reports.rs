//! Visit reports written by caregivers.

use sqlx::PgPool;

use kindred_core::{ServiceRequestId, UserId};

use super::RepositoryError;
use crate::models::CareReport;

/// Repository for care reports.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a report for a visit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service request does not exist.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        service_request_id: ServiceRequestId,
        author_user_id: UserId,
        summary: &str,
    ) -> Result<CareReport, RepositoryError> {
        let report = sqlx::query_as::<_, CareReport>(
            r"
            WITH inserted AS (
                INSERT INTO kindred.care_reports (service_request_id, author_user_id, summary)
                SELECT id, $2, $3 FROM kindred.service_requests WHERE id = $1
                RETURNING id, service_request_id, author_user_id, summary, created_at
            )
            SELECT i.id, i.service_request_id, i.author_user_id, i.summary, i.created_at,
                   sr.service_type
            FROM inserted i
            JOIN kindred.service_requests sr ON sr.id = i.service_request_id
            ",
        )
        .bind(service_request_id)
        .bind(author_user_id)
        .bind(summary)
        .fetch_optional(self.pool)
        .await?;

        report.ok_or(RepositoryError::NotFound)
    }

    /// Reports written by one caregiver, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_author(&self, author_user_id: UserId) -> Result<Vec<CareReport>, RepositoryError> {
        let reports = sqlx::query_as::<_, CareReport>(
            r"
            SELECT r.id, r.service_request_id, r.author_user_id, r.summary, r.created_at,
                   sr.service_type
            FROM kindred.care_reports r
            JOIN kindred.service_requests sr ON sr.id = r.service_request_id
            WHERE r.author_user_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(author_user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reports)
    }
}
