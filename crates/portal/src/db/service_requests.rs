//! Service request repository.

use chrono::NaiveDateTime;
use sqlx::PgPool;

use kindred_core::booking::{NewServiceRequest, ServiceRequest};
use kindred_core::{RequestStatus, ServiceRequestId, UserId};

use super::RepositoryError;

const REQUEST_COLUMNS: &str = "id, user_id, service_type, care_type, address, start_time, \
                               duration_hours, status, notes, created_at";

/// Repository for service requests.
pub struct ServiceRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRequestRepository<'a> {
    /// Create a new service request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a validated booking for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails. The message of
    /// the underlying error is shown to the person booking.
    pub async fn create(
        &self,
        user_id: UserId,
        request: &NewServiceRequest,
    ) -> Result<ServiceRequest, RepositoryError> {
        let created = sqlx::query_as::<_, ServiceRequest>(&format!(
            r"
            INSERT INTO kindred.service_requests
                (user_id, service_type, care_type, address, start_time, duration_hours, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&request.service_type)
        .bind(&request.care_type)
        .bind(&request.address)
        .bind(request.start_time)
        .bind(request.duration_hours)
        .bind(request.notes.as_deref())
        .bind(request.status)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Requests made by a user, latest start first. `None` lists them all.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM kindred.service_requests
             WHERE user_id = $1
             ORDER BY start_time DESC, id DESC
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// Open requests starting at or after `from`, for the caregiver schedule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_upcoming(
        &self,
        from: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM kindred.service_requests
             WHERE start_time >= $1 AND status IN ('pending', 'confirmed')
             ORDER BY start_time ASC
             LIMIT $2"
        ))
        .bind(from)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// Requests of any status starting at or after `from`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(
        &self,
        from: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM kindred.service_requests
             WHERE start_time >= $1
             ORDER BY start_time DESC
             LIMIT $2"
        ))
        .bind(from)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// Move a request from `expected` to `next`.
    ///
    /// Returns `false` when the stored status is no longer `expected`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        id: ServiceRequestId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE kindred.service_requests
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
