//! Carrier error log.
//!
//! Each row keeps what is needed to replay a failure by hand: the endpoint,
//! the HTTP status, the carrier's raw body and the exact payload sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use correio_labels_core::TenantId;
use serde_json::Value;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use super::repository::ErrorLogStore;

/// A failure to record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCarrierErrorLog {
    pub tenant_id: TenantId,
    /// Caller-facing action that failed, e.g. `generate_label`.
    pub action: String,
    pub endpoint: Option<String>,
    pub http_status: Option<u16>,
    pub raw_body: Option<String>,
    pub payload: Option<Value>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Postgres-backed [`ErrorLogStore`].
#[derive(Debug, Clone)]
pub struct ErrorLogRepository {
    pool: PgPool,
}

impl ErrorLogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ErrorLogStore for ErrorLogRepository {
    #[instrument(skip(self, entry), fields(tenant_id = %entry.tenant_id, action = %entry.action))]
    async fn log_error(&self, entry: &NewCarrierErrorLog) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carrier_error_logs
                (tenant_id, action, endpoint, http_status, raw_body, payload, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(entry.tenant_id)
        .bind(&entry.action)
        .bind(entry.endpoint.as_deref())
        .bind(entry.http_status.map(i32::from))
        .bind(entry.raw_body.as_deref())
        .bind(entry.payload.as_ref())
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
