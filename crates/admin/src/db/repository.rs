//! Storage seams used by the label service.
//!
//! Postgres implementations live beside this module; tests swap in
//! in-memory ones.

use async_trait::async_trait;
use correio_labels_core::{CarrierConfig, LabelRecord, SaleId, TenantId, TrackingEvent};

use super::RepositoryError;
use super::error_logs::NewCarrierErrorLog;

/// Per-tenant Correios configuration.
#[async_trait]
pub trait CarrierConfigStore: Send + Sync {
    /// Configuration for a tenant, if one was saved.
    async fn find(&self, tenant_id: TenantId) -> Result<Option<CarrierConfig>, RepositoryError>;

    /// Insert or replace the tenant's configuration.
    async fn upsert(&self, config: &CarrierConfig) -> Result<(), RepositoryError>;
}

/// Label records and their propagation onto sales.
#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Insert a new label record.
    async fn insert_label(&self, record: &LabelRecord) -> Result<(), RepositoryError>;

    /// Set the sale's tracking code.
    ///
    /// Returns `true` only when the stored value actually changed, so the
    /// caller appends exactly one history event per code.
    async fn set_sale_tracking_code(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
        tracking_code: &str,
    ) -> Result<bool, RepositoryError>;

    /// Append an entry to the sale's tracking history.
    async fn append_tracking_event(&self, event: &TrackingEvent) -> Result<(), RepositoryError>;
}

/// Carrier failure log.
#[async_trait]
pub trait ErrorLogStore: Send + Sync {
    async fn log_error(&self, entry: &NewCarrierErrorLog) -> Result<(), RepositoryError>;
}
