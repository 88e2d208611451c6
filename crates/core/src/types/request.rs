//! Label generation requests.

use serde::{Deserialize, Serialize};

use super::carrier::Address;
use super::id::{SaleId, TenantId};
use crate::dimensions::RequestedDims;

/// Who receives the package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub address: Address,
}

/// Per-shipment package override entered by the operator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageOverride {
    #[serde(flatten)]
    pub dims: RequestedDims,
    /// Declared value in centavos.
    #[serde(default)]
    pub declared_value_cents: Option<i64>,
}

/// A single request to generate one shipping label.
///
/// Never persisted as-is; the resulting label record keeps a snapshot of
/// the recipient and the dimensions actually sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRequest {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub sale_id: Option<SaleId>,
    pub recipient: Recipient,
    #[serde(default)]
    pub package: Option<PackageOverride>,
    #[serde(default)]
    pub service_code: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// NF-e access key; only a 44-digit key counts as a fiscal document.
    #[serde(default)]
    pub invoice_key: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_minimal_body() {
        let json = serde_json::json!({
            "tenant_id": "5f0c7b0e-8d1a-4a53-9d0e-3f1f6c2a9b10",
            "recipient": {
                "name": "Maria Souza",
                "address": {
                    "street": "Rua das Flores",
                    "number": "120",
                    "neighborhood": "Centro",
                    "city": "Porto Alegre",
                    "state": "rs",
                    "postal_code": "90010-000"
                }
            }
        });

        let request: LabelRequest = serde_json::from_value(json).unwrap();
        assert!(request.sale_id.is_none());
        assert!(request.package.is_none());
        assert_eq!(request.recipient.address.complement, None);
    }

    #[test]
    fn test_package_override_is_flat() {
        let json = serde_json::json!({
            "weight": 750.0,
            "length": 30.0,
            "declared_value_cents": 15990
        });

        let package: PackageOverride = serde_json::from_value(json).unwrap();
        assert_eq!(package.dims.weight, Some(750.0));
        assert_eq!(package.dims.height, None);
        assert_eq!(package.declared_value_cents, Some(15990));
    }
}
