//! Persisted shipping labels.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{LabelId, SaleId, TenantId};
use super::request::Recipient;
use super::status::LabelStatus;
use crate::dimensions::PackageDims;

/// A label accepted by the carrier.
///
/// Written once per successful pre-posting. Only downstream tracking
/// updates touch `status` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub id: LabelId,
    pub tenant_id: TenantId,
    pub sale_id: Option<SaleId>,
    pub tracking_code: String,
    pub service_code: String,
    pub service_name: String,
    /// Recipient exactly as it was sent to the carrier.
    pub recipient: Recipient,
    /// Dimensions after validation.
    pub dimensions: PackageDims,
    /// Declared value in reais.
    pub declared_value: Decimal,
    pub shipping_cost: Option<Decimal>,
    pub label_pdf_url: Option<String>,
    pub declaration_pdf_url: Option<String>,
    pub status: LabelStatus,
    /// Carrier's internal pre-posting id.
    pub pre_posting_id: String,
    /// Raw pre-posting response body.
    pub api_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A tracking-history entry appended to a sale's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub sale_id: SaleId,
    pub tracking_code: String,
    pub status: LabelStatus,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}
