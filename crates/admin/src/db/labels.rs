//! Shipping label repository.
//!
//! Writes label records and propagates the tracking code onto the
//! originating sale.

use async_trait::async_trait;
use correio_labels_core::{LabelRecord, SaleId, TenantId, TrackingEvent};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, instrument};

use super::repository::LabelStore;
use super::{RepositoryError, map_unique_violation};

/// Postgres-backed [`LabelStore`].
#[derive(Debug, Clone)]
pub struct LabelRepository {
    pool: PgPool,
}

impl LabelRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn dimension(value: u32, field: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{field} out of range: {value}")))
}

#[async_trait]
impl LabelStore for LabelRepository {
    #[instrument(skip(self, record), fields(tracking_code = %record.tracking_code))]
    async fn insert_label(&self, record: &LabelRecord) -> Result<(), RepositoryError> {
        let dims = &record.dimensions;

        sqlx::query(
            r"
            INSERT INTO shipping_labels (
                id, tenant_id, sale_id, tracking_code, service_code, service_name,
                recipient, weight, height, width, length,
                declared_value, shipping_cost, label_pdf_url, declaration_pdf_url,
                status, pre_posting_id, api_response, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19)
            ",
        )
        .bind(record.id)
        .bind(record.tenant_id)
        .bind(record.sale_id)
        .bind(&record.tracking_code)
        .bind(&record.service_code)
        .bind(&record.service_name)
        .bind(Json(&record.recipient))
        .bind(dimension(dims.weight, "weight")?)
        .bind(dimension(dims.height, "height")?)
        .bind(dimension(dims.width, "width")?)
        .bind(dimension(dims.length, "length")?)
        .bind(record.declared_value)
        .bind(record.shipping_cost)
        .bind(record.label_pdf_url.as_deref())
        .bind(record.declaration_pdf_url.as_deref())
        .bind(record.status.to_string())
        .bind(&record.pre_posting_id)
        .bind(&record.api_response)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "label for this tracking code"))?;

        debug!(label_id = %record.id, "Label record inserted");
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, sale_id = %sale_id))]
    async fn set_sale_tracking_code(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
        tracking_code: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE sales
            SET tracking_code = $3, updated_at = NOW()
            WHERE id = $1
              AND tenant_id = $2
              AND tracking_code IS DISTINCT FROM $3
            ",
        )
        .bind(sale_id)
        .bind(tenant_id)
        .bind(tracking_code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, event), fields(sale_id = %event.sale_id))]
    async fn append_tracking_event(&self, event: &TrackingEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO tracking_history (sale_id, tracking_code, status, description, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(event.sale_id)
        .bind(&event.tracking_code)
        .bind(event.status.to_string())
        .bind(&event.description)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_range() {
        assert_eq!(dimension(30_000, "weight").ok(), Some(30_000));
        assert!(matches!(
            dimension(u32::MAX, "weight"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
